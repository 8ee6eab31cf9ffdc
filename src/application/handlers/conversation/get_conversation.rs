//! GetConversation query handler.
//!
//! Closed conversations stay readable.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::{ConversationId, DomainError};
use crate::ports::ConversationStore;

#[derive(Debug, Clone, Copy)]
pub struct GetConversationQuery {
    pub conversation_id: ConversationId,
}

/// A conversation with its full transcript, oldest message first.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

pub struct GetConversationHandler {
    store: Arc<dyn ConversationStore>,
}

impl GetConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetConversationQuery) -> Result<ConversationDetail, DomainError> {
        let conversation = self
            .store
            .find_conversation(&query.conversation_id)
            .await?
            .ok_or_else(|| DomainError::conversation_not_found(query.conversation_id))?;
        let messages = self.store.messages(&query.conversation_id).await?;

        Ok(ConversationDetail {
            conversation,
            messages,
        })
    }
}
