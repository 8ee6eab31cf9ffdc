//! Response splitter.
//!
//! Turns one completion into the ordered chat bubbles shown to the visitor.
//! Paragraph breaks win outright; otherwise long answers are packed sentence
//! by sentence into parts of at most `word_limit` words. A sentence is never
//! cut in half.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default maximum words per displayed part.
pub const DEFAULT_WORD_LIMIT: usize = 40;

const PARAGRAPH_BREAK: &str = "\n\n";

/// A sentence terminator (Latin or Bengali) followed by whitespace.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?।॥]\s+").expect("sentence boundary pattern is valid"));

/// Splits completions into display parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSplitter {
    word_limit: usize,
}

impl Default for ResponseSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_WORD_LIMIT)
    }
}

impl ResponseSplitter {
    /// Creates a splitter; a zero limit is raised to one.
    pub fn new(word_limit: usize) -> Self {
        Self {
            word_limit: word_limit.max(1),
        }
    }

    pub fn word_limit(&self) -> usize {
        self.word_limit
    }

    /// Splits `full_text` into one or more parts, in original order.
    ///
    /// Always returns at least one element.
    pub fn split(&self, full_text: &str) -> Vec<String> {
        if full_text.contains(PARAGRAPH_BREAK) {
            let paragraphs: Vec<String> = full_text
                .split(PARAGRAPH_BREAK)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if paragraphs.len() >= 2 {
                return paragraphs;
            }
        }

        if count_words(full_text) <= self.word_limit {
            return vec![full_text.to_string()];
        }

        let sentences = split_sentences(full_text);
        if sentences.len() < 2 {
            return vec![full_text.to_string()];
        }

        let parts = self.pack(&sentences);
        if parts.is_empty() {
            vec![full_text.to_string()]
        } else {
            parts
        }
    }

    /// Greedy packing: a part is closed when the next sentence would push it
    /// past the limit. An oversized sentence still gets a part of its own.
    fn pack(&self, sentences: &[&str]) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut current_words = 0;

        for sentence in sentences {
            let words = count_words(sentence);
            if current_words + words > self.word_limit && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_words = 0;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_words += words;
        }

        let last = current.trim();
        if !last.is_empty() {
            parts.push(last.to_string());
        }
        parts
    }
}

/// Splits text after each sentence terminator, dropping the whitespace that
/// follows it. Empty pieces are discarded.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // Terminator is the first char of the match; keep it with its sentence.
        let terminator_len = boundary
            .as_str()
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(0);
        let end = boundary.start() + terminator_len;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Counts words the way a visitor would: runs of letters, where letters
/// include accented Latin and the Bengali block, and an apostrophe or hyphen
/// inside a run does not break it. Digits and punctuation separate words.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if is_word_char(c) {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else if in_word && (c == '\'' || c == '-') {
            continue;
        } else {
            in_word = false;
        }
    }
    count
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || ('\u{0980}'..='\u{09FF}').contains(&c)
}
