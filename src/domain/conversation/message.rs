//! Message record within a conversation.
//!
//! A message is one visitor turn plus its eventual response, or a
//! system-injected continuation that carries one part of a multi-part answer.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, Timestamp};

/// A stored message.
///
/// # Invariants
///
/// - `text` is `None` only when `is_system_message` is true
/// - continuation messages are created with `response_text` already filled
/// - the response slot of a visitor message is filled at most once by the AI path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub text: Option<String>,
    pub response_text: Option<String>,
    pub is_from_human: bool,
    pub is_response_from_human: bool,
    pub is_system_message: bool,
    pub created_at: Timestamp,
    pub response_at: Option<Timestamp>,
}

impl Message {
    /// Returns true when no response has been written yet.
    pub fn is_pending(&self) -> bool {
        self.response_text.is_none()
    }

    /// Returns true for a visitor turn that is still waiting for an answer.
    pub fn is_unanswered_visitor_turn(&self) -> bool {
        !self.is_system_message && self.text.is_some() && self.is_pending()
    }

    /// Text shown in admin previews: the visitor text, or the response for continuations.
    pub fn preview(&self) -> Option<&str> {
        self.text.as_deref().or(self.response_text.as_deref())
    }
}
