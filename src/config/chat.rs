//! Chat widget and conversation behaviour configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::conversation::{ResponseSplitter, TypingPacing};

/// Widget, splitting, pacing and retention settings
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Master switch for visitor messaging
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether agents may take conversations over from the AI
    #[serde(default = "default_true")]
    pub human_takeover_enabled: bool,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_theme_color")]
    pub theme_color: String,

    #[serde(default = "default_welcome_guest")]
    pub welcome_message_guest: String,

    /// Greeting for identified visitors; `{name}` is replaced by their name
    #[serde(default = "default_welcome_known")]
    pub welcome_message_known: String,

    /// Generic apology shown when no provider message is available
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Maximum words per displayed part
    #[serde(default = "default_split_word_limit")]
    pub split_word_limit: usize,

    #[serde(default = "default_base_delay")]
    pub typing_base_delay_ms: u64,

    #[serde(default = "default_per_char")]
    pub typing_per_char_ms: u64,

    #[serde(default = "default_max_typing")]
    pub typing_max_ms: u64,

    /// Closed conversations idle longer than this are deleted
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Seconds between retention sweeps; 0 disables the sweep
    #[serde(default = "default_sweep_interval")]
    pub retention_sweep_interval_secs: u64,
}

impl ChatConfig {
    pub fn splitter(&self) -> ResponseSplitter {
        ResponseSplitter::new(self.split_word_limit)
    }

    pub fn pacing(&self) -> TypingPacing {
        TypingPacing::new(
            Duration::from_millis(self.typing_base_delay_ms),
            Duration::from_millis(self.typing_per_char_ms),
            Duration::from_millis(self.typing_max_ms),
        )
    }

    /// `None` when the sweep is disabled
    pub fn retention_sweep_interval(&self) -> Option<Duration> {
        (self.retention_sweep_interval_secs > 0)
            .then(|| Duration::from_secs(self.retention_sweep_interval_secs))
    }

    /// Validate chat configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_hex_color(&self.theme_color) {
            return Err(ValidationError::InvalidThemeColor);
        }
        if self.split_word_limit == 0 {
            return Err(ValidationError::MustBePositive("CHAT__SPLIT_WORD_LIMIT"));
        }
        if self.retention_days == 0 {
            return Err(ValidationError::MustBePositive("CHAT__RETENTION_DAYS"));
        }
        if self.error_message.trim().is_empty() {
            return Err(ValidationError::MissingRequired("CHAT__ERROR_MESSAGE"));
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            human_takeover_enabled: true,
            title: default_title(),
            theme_color: default_theme_color(),
            welcome_message_guest: default_welcome_guest(),
            welcome_message_known: default_welcome_known(),
            error_message: default_error_message(),
            split_word_limit: default_split_word_limit(),
            typing_base_delay_ms: default_base_delay(),
            typing_per_char_ms: default_per_char(),
            typing_max_ms: default_max_typing(),
            retention_days: default_retention_days(),
            retention_sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn default_true() -> bool {
    true
}

fn default_title() -> String {
    "Chat with us".to_string()
}

fn default_theme_color() -> String {
    "#4a51bf".to_string()
}

fn default_welcome_guest() -> String {
    "Hi, Do you need help?".to_string()
}

fn default_welcome_known() -> String {
    "Hello {name}, how can I help you today?".to_string()
}

fn default_error_message() -> String {
    "Sorry, there was an error. Please try again.".to_string()
}

fn default_split_word_limit() -> usize {
    40
}

fn default_base_delay() -> u64 {
    1000
}

fn default_per_char() -> u64 {
    20
}

fn default_max_typing() -> u64 {
    2000
}

fn default_retention_days() -> u32 {
    30
}

fn default_sweep_interval() -> u64 {
    3600
}
