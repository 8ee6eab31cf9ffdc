//! Conversation lifecycle and response ownership.
//!
//! Two independent axes describe a conversation:
//! - `ConversationStatus`: `Active` until closed, `Closed` is terminal.
//! - `ResponseOwner`: who answers inbound visitor messages, the AI or a human agent.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Visible in admin listings, accepts messages and ownership changes.
    #[default]
    Active,

    /// Read-only transcript kept for history and audit.
    Closed,
}

impl ConversationStatus {
    /// Builds the status from the persisted `is_active` flag.
    pub fn from_active_flag(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Closed
        }
    }

    /// Returns true while the conversation has not been closed.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl StateMachine for ConversationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (Self::Active, Self::Closed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Active => vec![Self::Closed],
            Self::Closed => vec![],
        }
    }
}

/// Who currently owns response duty for a conversation.
///
/// Exactly one owner exists at any time. Persisted as the boolean
/// `is_human_takeover` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOwner {
    /// The completion provider answers every inbound message.
    #[default]
    Ai,

    /// A human agent answers; inbound messages are only stored.
    Human,
}

impl ResponseOwner {
    /// Builds the owner from the persisted `is_human_takeover` flag.
    pub fn from_takeover_flag(is_human_takeover: bool) -> Self {
        if is_human_takeover {
            Self::Human
        } else {
            Self::Ai
        }
    }

    /// Value of the persisted `is_human_takeover` flag.
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }
}
