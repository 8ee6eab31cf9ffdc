//! Completion Client Port - Interface to the external text-generation service.
//!
//! The orchestrator hands over a system prompt, the ordered transcript and the
//! new visitor message, and gets back one trimmed completion string. Splitting
//! the answer into display parts is not this port's job.
//!
//! # Error taxonomy
//!
//! - `MissingCredential` - no API credential configured (checked before any I/O)
//! - `Upstream` - provider answered but the payload is unusable
//! - `Transport` - network failure or timeout

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::Message;

/// Default number of transcript entries sent with a request.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Port for the completion provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produces a single completion for `request`.
    ///
    /// Implementations perform one attempt with a bounded timeout; there are
    /// no automatic retries.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// One transcript entry: a visitor turn and its response, either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: Option<String>,
    pub response_text: Option<String>,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, response_text: Option<String>) -> Self {
        Self {
            text: Some(text.into()),
            response_text,
        }
    }
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            text: message.text.clone(),
            response_text: message.response_text.clone(),
        }
    }
}

/// Everything needed for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    /// Transcript in canonical order, oldest first.
    pub history: Vec<HistoryEntry>,
    pub new_message: String,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        history: Vec<HistoryEntry>,
        new_message: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history,
            new_message: new_message.into(),
        }
    }

    /// The most recent `limit` history entries, in original order.
    pub fn recent_history(&self, limit: usize) -> &[HistoryEntry] {
        let skip = self.history.len().saturating_sub(limit);
        &self.history[skip..]
    }

    /// Role-tagged message sequence: system prompt, then a user turn and an
    /// optional assistant turn per kept history entry, then the new user turn.
    pub fn to_chat_messages(&self, history_limit: usize) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(&self.system_prompt)];

        for entry in self.recent_history(history_limit) {
            if let Some(text) = entry.text.as_deref() {
                messages.push(ChatMessage::user(text));
            }
            if let Some(response) = entry.response_text.as_deref().filter(|r| !r.is_empty()) {
                messages.push(ChatMessage::assistant(response));
            }
        }

        messages.push(ChatMessage::user(&self.new_message));
        messages
    }
}

/// A role-tagged chat message in provider wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Why the provider's answer was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    RateLimited,
    Authentication,
    MalformedResponse,
    Provider,
}

impl std::fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RateLimited => "rate_limited",
            Self::Authentication => "authentication",
            Self::MalformedResponse => "malformed_response",
            Self::Provider => "provider",
        };
        write!(f, "{}", s)
    }
}

/// Completion failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// No API credential configured.
    #[error("completion provider credential is not configured")]
    MissingCredential,

    /// Provider reachable but returned an unusable payload.
    #[error("{message}")]
    Upstream {
        kind: UpstreamErrorKind,
        message: String,
    },

    /// Network failure or timeout.
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },
}

impl CompletionError {
    pub fn upstream(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self::Upstream {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>, timed_out: bool) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out,
        }
    }

    /// Message suitable for the visitor, if the error carries one.
    ///
    /// Only upstream errors carry a provider message; the others are shown as
    /// the configured generic apology.
    pub fn visitor_message(&self) -> Option<&str> {
        match self {
            Self::Upstream { message, .. } => Some(message),
            Self::MissingCredential | Self::Transport { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchanges(n: usize) -> Vec<HistoryEntry> {
        (0..n)
            .map(|i| HistoryEntry::new(format!("q{}", i), Some(format!("a{}", i))))
            .collect()
    }

    #[test]
    fn completion_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn CompletionClient) {}
    }

    #[test]
    fn builds_system_history_and_new_turn_in_order() {
        let request = CompletionRequest::new(
            "Be helpful.",
            vec![
                HistoryEntry::new("Hi", Some("Hello!".to_string())),
                HistoryEntry::new("Still there?", None),
            ],
            "Where is my order?",
        );

        let messages = request.to_chat_messages(DEFAULT_HISTORY_LIMIT);

        assert_eq!(
            messages,
            vec![
                ChatMessage::system("Be helpful."),
                ChatMessage::user("Hi"),
                ChatMessage::assistant("Hello!"),
                ChatMessage::user("Still there?"),
                ChatMessage::user("Where is my order?"),
            ]
        );
    }

    #[test]
    fn fifteen_exchanges_truncate_to_most_recent_ten() {
        let request = CompletionRequest::new("sys", exchanges(15), "new");

        let kept = request.recent_history(10);
        assert_eq!(kept.len(), 10);
        assert_eq!(kept[0].text.as_deref(), Some("q5"));
        assert_eq!(kept[9].text.as_deref(), Some("q14"));

        // system + 10 * (user + assistant) + new user
        assert_eq!(request.to_chat_messages(10).len(), 22);
    }

    #[test]
    fn short_history_is_kept_whole() {
        let request = CompletionRequest::new("sys", exchanges(3), "new");
        assert_eq!(request.recent_history(10).len(), 3);
    }

    #[test]
    fn continuation_entries_contribute_only_assistant_turns() {
        let request = CompletionRequest::new(
            "sys",
            vec![HistoryEntry {
                text: None,
                response_text: Some("second part".to_string()),
            }],
            "new",
        );

        let roles: Vec<ChatRole> = request.to_chat_messages(10).iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::System, ChatRole::Assistant, ChatRole::User]);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("x")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn only_upstream_errors_carry_visitor_message() {
        let upstream = CompletionError::upstream(UpstreamErrorKind::Provider, "model overloaded");
        assert_eq!(upstream.visitor_message(), Some("model overloaded"));
        assert_eq!(upstream.to_string(), "model overloaded");
        assert_eq!(CompletionError::MissingCredential.visitor_message(), None);
        assert_eq!(CompletionError::transport("timeout", true).visitor_message(), None);
    }
}
