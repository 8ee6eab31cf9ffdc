//! HumanResponse command handler.
//!
//! An agent's reply is attached to the most recent message of the
//! conversation, whatever its current state.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::conversation::Message;
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode};
use crate::ports::ConversationStore;

#[derive(Debug, Clone)]
pub struct HumanResponseCommand {
    pub conversation_id: ConversationId,
    pub text: String,
}

impl HumanResponseCommand {
    pub fn new(conversation_id: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum HumanResponseError {
    #[error("Validation error: response cannot be empty")]
    EmptyResponse,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Handler for agent replies.
pub struct HumanResponseHandler {
    store: Arc<dyn ConversationStore>,
}

impl HumanResponseHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Returns the message the response was attached to.
    pub async fn handle(&self, cmd: HumanResponseCommand) -> Result<Message, HumanResponseError> {
        let text = cmd.text.trim();
        if text.is_empty() {
            return Err(HumanResponseError::EmptyResponse);
        }

        let conversation = self
            .store
            .find_conversation(&cmd.conversation_id)
            .await?
            .ok_or_else(|| DomainError::conversation_not_found(cmd.conversation_id))?;
        if !conversation.is_active() {
            return Err(DomainError::new(
                ErrorCode::ConversationClosed,
                format!("Conversation {} is closed", cmd.conversation_id),
            )
            .into());
        }

        let last = self
            .store
            .last_message(&cmd.conversation_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::MessageNotFound,
                    format!("Conversation {} has no messages", cmd.conversation_id),
                )
            })?;

        if last.response_text.is_some() {
            // TODO: attach to the oldest unanswered visitor turn once agents can pick a message
            tracing::warn!(
                conversation_id = %cmd.conversation_id,
                message_id = %last.id,
                "Human response replaces an existing response"
            );
        }

        let message = self.store.append_response(&last.id, text, true).await?;
        tracing::info!(
            conversation_id = %cmd.conversation_id,
            message_id = %message.id,
            "Human response stored"
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::conversation::NewConversation;

    async fn setup() -> (Arc<InMemoryConversationStore>, HumanResponseHandler, ConversationId) {
        let store = Arc::new(InMemoryConversationStore::new());
        let conversation = store
            .create_conversation(NewConversation::default())
            .await
            .unwrap();
        let handler = HumanResponseHandler::new(store.clone());
        (store, handler, conversation.id())
    }

    #[tokio::test]
    async fn attaches_to_latest_message() {
        let (store, handler, id) = setup().await;
        store.append_message(&id, "first").await.unwrap();
        let latest = store.append_message(&id, "second").await.unwrap();

        let answered = handler
            .handle(HumanResponseCommand::new(id, "Let me check that for you."))
            .await
            .unwrap();

        assert_eq!(answered.id, latest.id);
        assert_eq!(answered.response_text.as_deref(), Some("Let me check that for you."));
        assert!(answered.is_response_from_human);
        assert!(answered.response_at.is_some());
    }

    #[tokio::test]
    async fn conversation_without_messages_is_not_found() {
        let (_store, handler, id) = setup().await;

        let err = handler
            .handle(HumanResponseCommand::new(id, "Hello?"))
            .await
            .unwrap_err();

        assert!(matches!(err, HumanResponseError::Domain(e) if e.code() == ErrorCode::MessageNotFound));
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let (_store, handler, _id) = setup().await;

        let err = handler
            .handle(HumanResponseCommand::new(ConversationId::new(), "Hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, HumanResponseError::Domain(e) if e.code() == ErrorCode::ConversationNotFound));
    }

    #[tokio::test]
    async fn closed_conversation_is_rejected() {
        let (store, handler, id) = setup().await;
        store.append_message(&id, "bye").await.unwrap();
        store.close_conversation(&id).await.unwrap();

        let err = handler.handle(HumanResponseCommand::new(id, "Hi")).await.unwrap_err();

        assert!(matches!(err, HumanResponseError::Domain(e) if e.code() == ErrorCode::ConversationClosed));
    }

    #[tokio::test]
    async fn blank_response_is_rejected() {
        let (store, handler, id) = setup().await;
        store.append_message(&id, "hi").await.unwrap();

        let err = handler.handle(HumanResponseCommand::new(id, "  ")).await.unwrap_err();

        assert!(matches!(err, HumanResponseError::EmptyResponse));
    }
}
