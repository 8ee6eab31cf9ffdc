//! Conversation store port.
//!
//! Persistence operations over conversations and their messages. Every
//! message or response write also bumps the owning conversation's
//! `updated_at`, atomically with the write.
//!
//! # Design
//!
//! - **Append-only messages**: messages are never deleted individually; only
//!   the response slot of a visitor message is filled after creation
//! - **Canonical order**: `created_at` ascending, store sequence id breaks ties
//! - **Last write wins** on response ownership

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::conversation::{Conversation, Message, NewConversation, ResponseOwner};
use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp};

/// Store port for conversations and messages.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates a new active, AI-owned conversation.
    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation, DomainError>;

    /// Returns `None` if no conversation has this id.
    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError>;

    /// Stores a visitor message with an empty response slot.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation doesn't exist
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<Message, DomainError>;

    /// Fills the response slot of a message and stamps `response_at`.
    ///
    /// # Errors
    ///
    /// - `MessageNotFound` if the message doesn't exist
    async fn append_response(
        &self,
        message_id: &MessageId,
        response: &str,
        from_human: bool,
    ) -> Result<Message, DomainError>;

    /// Stores a continuation part: no visitor text, response already filled.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation doesn't exist
    async fn append_system_message(
        &self,
        conversation_id: &ConversationId,
        response: &str,
    ) -> Result<Message, DomainError>;

    /// Sets who answers the conversation.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation doesn't exist
    async fn set_response_owner(
        &self,
        id: &ConversationId,
        owner: ResponseOwner,
    ) -> Result<(), DomainError>;

    /// Marks the conversation closed.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation doesn't exist
    async fn close_conversation(&self, id: &ConversationId) -> Result<(), DomainError>;

    /// Active conversations, `updated_at` descending, each with its latest message.
    async fn list_active(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError>;

    /// Number of active conversations.
    async fn count_active(&self) -> Result<u64, DomainError>;

    /// Full transcript in canonical order.
    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, DomainError>;

    /// Most recently created message, if any.
    async fn last_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, DomainError>;

    /// Aggregate counts, with daily new-conversation counts from `since` on.
    async fn statistics(&self, since: Timestamp) -> Result<ConversationStats, DomainError>;

    /// Active conversations that are human-owned or have an unanswered visitor
    /// message, by unanswered count descending then `updated_at` descending.
    async fn needing_attention(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AttentionItem>, DomainError>;

    /// Active conversations whose message text, response text or client
    /// address contains `term` (case-insensitive), `updated_at` descending.
    async fn search(
        &self,
        term: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError>;

    /// Deletes closed conversations (and their messages) last updated before
    /// `cutoff`. Returns the number of conversations removed.
    async fn purge_closed_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

/// A conversation paired with its latest message, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}

/// A conversation that needs an agent's eye.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttentionItem {
    pub summary: ConversationSummary,
    pub unanswered_count: u64,
}

/// New conversations started on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Store-wide counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationStats {
    pub total_conversations: u64,
    pub active_conversations: u64,
    /// Active conversations currently owned by a human agent.
    pub human_owned_conversations: u64,
    pub total_messages: u64,
    /// Days with at least one new conversation, ascending.
    pub daily_new_conversations: Vec<DailyCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ConversationStore) {}
    }
}
