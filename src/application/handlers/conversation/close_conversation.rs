//! CloseConversation command handler.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, DomainError};
use crate::ports::ConversationStore;

#[derive(Debug, Clone, Copy)]
pub struct CloseConversationCommand {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseConversationResult {
    pub conversation_id: ConversationId,
    /// False when the conversation was already closed.
    pub closed_now: bool,
}

/// Handler for closing conversations. Closing twice is not an error.
pub struct CloseConversationHandler {
    store: Arc<dyn ConversationStore>,
}

impl CloseConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: CloseConversationCommand,
    ) -> Result<CloseConversationResult, DomainError> {
        let mut conversation = self
            .store
            .find_conversation(&cmd.conversation_id)
            .await?
            .ok_or_else(|| DomainError::conversation_not_found(cmd.conversation_id))?;

        let closed_now = conversation.close()?;
        if closed_now {
            self.store.close_conversation(&cmd.conversation_id).await?;
            tracing::info!(conversation_id = %cmd.conversation_id, "Conversation closed");
        }

        Ok(CloseConversationResult {
            conversation_id: cmd.conversation_id,
            closed_now,
        })
    }
}
