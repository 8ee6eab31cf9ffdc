//! Conversation aggregate.
//!
//! Carries provenance (owner, session, client origin), lifecycle status and
//! response ownership. Provenance is fixed at creation; status and ownership
//! change only through the methods below, which also bump `updated_at`.

use serde::{Deserialize, Serialize};

use super::state::{ConversationStatus, ResponseOwner};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, StateMachine, Timestamp};

/// Where a conversation came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginInfo {
    /// Client network address, `0.0.0.0` when unknown.
    pub client_address: String,
    /// Client agent string as sent by the browser.
    pub client_agent: Option<String>,
}

impl OriginInfo {
    /// Placeholder address used when no valid client address is available.
    pub const UNKNOWN_ADDRESS: &'static str = "0.0.0.0";

    pub fn new(client_address: impl Into<String>, client_agent: Option<String>) -> Self {
        Self {
            client_address: client_address.into(),
            client_agent,
        }
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN_ADDRESS, None)
    }
}

impl Default for OriginInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Provenance of a conversation about to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewConversation {
    pub owner_ref: Option<String>,
    pub session_ref: Option<String>,
    pub origin: OriginInfo,
}

/// A visitor's chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    owner_ref: Option<String>,
    session_ref: Option<String>,
    origin: OriginInfo,
    status: ConversationStatus,
    owner: ResponseOwner,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Starts a new AI-owned, active conversation.
    pub fn start(id: ConversationId, new: NewConversation) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            owner_ref: new.owner_ref,
            session_ref: new.session_ref,
            origin: new.origin,
            status: ConversationStatus::Active,
            owner: ResponseOwner::Ai,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a conversation from persisted columns.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ConversationId,
        owner_ref: Option<String>,
        session_ref: Option<String>,
        origin: OriginInfo,
        status: ConversationStatus,
        owner: ResponseOwner,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_ref,
            session_ref,
            origin,
            status,
            owner,
            created_at,
            updated_at,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn owner_ref(&self) -> Option<&str> {
        self.owner_ref.as_deref()
    }

    pub fn session_ref(&self) -> Option<&str> {
        self.session_ref.as_deref()
    }

    pub fn origin(&self) -> &OriginInfo {
        &self.origin
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn owner(&self) -> ResponseOwner {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_human_owned(&self) -> bool {
        self.owner.is_human()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    // ───────────────────────────────────────────────────────────────
    // Transitions
    // ───────────────────────────────────────────────────────────────

    /// Hands response duty to `owner`. Setting the current owner again is a no-op
    /// that still counts as a write.
    ///
    /// # Errors
    ///
    /// - `ConversationClosed` if the conversation has been closed
    pub fn assign_owner(&mut self, owner: ResponseOwner) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.owner = owner;
        self.touch();
        Ok(())
    }

    /// Closes the conversation. Returns `false` if it was already closed.
    pub fn close(&mut self) -> Result<bool, DomainError> {
        if !self.is_active() {
            return Ok(false);
        }
        self.status = self.status.transition_to(ConversationStatus::Closed)?;
        self.touch();
        Ok(true)
    }

    /// Records that a message or response was written.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::ConversationClosed,
                format!("Conversation {} is closed", self.id),
            )
            .with_detail("conversation_id", self.id.to_string()))
        }
    }
}
