//! Takeover and return-to-AI command handler.
//!
//! Both transitions are idempotent: assigning the current owner again
//! succeeds without a write. Closed conversations reject either one.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::conversation::ResponseOwner;
use crate::domain::foundation::{ConversationId, DomainError};
use crate::ports::ConversationStore;

/// Command to hand response duty to the AI or a human agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeOwnerCommand {
    pub conversation_id: ConversationId,
    pub owner: ResponseOwner,
}

impl ChangeOwnerCommand {
    /// AI to human.
    pub fn takeover(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            owner: ResponseOwner::Human,
        }
    }

    /// Human back to AI.
    pub fn return_to_ai(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            owner: ResponseOwner::Ai,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOwnerResult {
    pub conversation_id: ConversationId,
    pub owner: ResponseOwner,
    /// False when the conversation already had this owner.
    pub changed: bool,
}

#[derive(Debug, Clone, Error)]
pub enum OwnershipError {
    /// Human takeover is switched off.
    #[error("Human takeover is disabled")]
    TakeoverDisabled,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Handler for ownership changes.
pub struct ChangeOwnerHandler {
    store: Arc<dyn ConversationStore>,
    takeover_enabled: bool,
}

impl ChangeOwnerHandler {
    pub fn new(store: Arc<dyn ConversationStore>, takeover_enabled: bool) -> Self {
        Self {
            store,
            takeover_enabled,
        }
    }

    pub async fn handle(&self, cmd: ChangeOwnerCommand) -> Result<ChangeOwnerResult, OwnershipError> {
        if cmd.owner.is_human() && !self.takeover_enabled {
            return Err(OwnershipError::TakeoverDisabled);
        }

        let mut conversation = self
            .store
            .find_conversation(&cmd.conversation_id)
            .await?
            .ok_or_else(|| DomainError::conversation_not_found(cmd.conversation_id))?;

        let previous = conversation.owner();
        conversation.assign_owner(cmd.owner)?;

        let changed = previous != cmd.owner;
        if changed {
            self.store
                .set_response_owner(&cmd.conversation_id, cmd.owner)
                .await?;
            tracing::info!(
                conversation_id = %cmd.conversation_id,
                from = ?previous,
                to = ?cmd.owner,
                "Response owner changed"
            );
        }

        Ok(ChangeOwnerResult {
            conversation_id: cmd.conversation_id,
            owner: cmd.owner,
            changed,
        })
    }
}
