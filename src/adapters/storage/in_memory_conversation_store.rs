//! In-Memory Conversation Store Adapter
//!
//! Keeps conversations and messages in process memory behind a single lock,
//! so each write and its `updated_at` bump happen together.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{Conversation, Message, NewConversation, ResponseOwner};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, MessageId, Timestamp};
use crate::ports::{
    AttentionItem, ConversationStats, ConversationStore, ConversationSummary, DailyCount,
};

#[derive(Debug, Default)]
struct Inner {
    conversations: HashMap<ConversationId, Conversation>,
    /// Keyed by id; ids increase with insertion order.
    messages: BTreeMap<MessageId, Message>,
    next_message_id: i64,
}

impl Inner {
    fn conversation_mut(&mut self, id: &ConversationId) -> Result<&mut Conversation, DomainError> {
        self.conversations
            .get_mut(id)
            .ok_or_else(|| DomainError::conversation_not_found(*id))
    }

    fn insert_message(&mut self, mut message: Message) -> Message {
        self.next_message_id += 1;
        message.id = MessageId::from_i64(self.next_message_id);
        self.messages.insert(message.id, message.clone());
        message
    }

    /// Canonical transcript order: created_at, then id.
    fn transcript(&self, conversation_id: &ConversationId) -> Vec<&Message> {
        let mut messages: Vec<&Message> = self
            .messages
            .values()
            .filter(|m| m.conversation_id == *conversation_id)
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        messages
    }

    fn summary(&self, conversation: &Conversation) -> ConversationSummary {
        ConversationSummary {
            conversation: conversation.clone(),
            last_message: self.transcript(&conversation.id()).last().map(|m| (*m).clone()),
        }
    }

    fn active_by_recency(&self) -> Vec<&Conversation> {
        let mut active: Vec<&Conversation> = self
            .conversations
            .values()
            .filter(|c| c.is_active())
            .collect();
        sort_by_recency(&mut active);
        active
    }
}

fn sort_by_recency(conversations: &mut [&Conversation]) {
    conversations.sort_by(|a, b| {
        b.updated_at()
            .cmp(&a.updated_at())
            .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
    });
}

fn page<T>(items: Vec<T>, limit: u32, offset: u32) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

/// In-memory conversation store
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations, active or closed
    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.conversations.len()
    }

    /// Number of stored messages across all conversations
    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    /// Overrides `updated_at` (useful for retention tests)
    pub async fn set_updated_at(
        &self,
        id: &ConversationId,
        updated_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.conversation_mut(id)?;
        *conversation = Conversation::reconstitute(
            conversation.id(),
            conversation.owner_ref().map(String::from),
            conversation.session_ref().map(String::from),
            conversation.origin().clone(),
            conversation.status(),
            conversation.owner(),
            conversation.created_at(),
            updated_at,
        );
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self, new: NewConversation) -> Result<Conversation, DomainError> {
        let conversation = Conversation::start(ConversationId::new(), new);
        self.inner
            .write()
            .await
            .conversations
            .insert(conversation.id(), conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError> {
        Ok(self.inner.read().await.conversations.get(id).cloned())
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<Message, DomainError> {
        let mut inner = self.inner.write().await;
        inner.conversation_mut(conversation_id)?.touch();
        Ok(inner.insert_message(Message {
            id: MessageId::from_i64(0),
            conversation_id: *conversation_id,
            text: Some(text.to_string()),
            response_text: None,
            is_from_human: false,
            is_response_from_human: false,
            is_system_message: false,
            created_at: Timestamp::now(),
            response_at: None,
        }))
    }

    async fn append_response(
        &self,
        message_id: &MessageId,
        response: &str,
        from_human: bool,
    ) -> Result<Message, DomainError> {
        let mut inner = self.inner.write().await;
        let message = inner.messages.get_mut(message_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::MessageNotFound,
                format!("Message not found: {}", message_id),
            )
        })?;
        message.response_text = Some(response.to_string());
        message.is_response_from_human = from_human;
        message.response_at = Some(Timestamp::now());
        let updated = message.clone();

        inner.conversation_mut(&updated.conversation_id)?.touch();
        Ok(updated)
    }

    async fn append_system_message(
        &self,
        conversation_id: &ConversationId,
        response: &str,
    ) -> Result<Message, DomainError> {
        let mut inner = self.inner.write().await;
        inner.conversation_mut(conversation_id)?.touch();
        let now = Timestamp::now();
        Ok(inner.insert_message(Message {
            id: MessageId::from_i64(0),
            conversation_id: *conversation_id,
            text: None,
            response_text: Some(response.to_string()),
            is_from_human: false,
            is_response_from_human: false,
            is_system_message: true,
            created_at: now,
            response_at: Some(now),
        }))
    }

    async fn set_response_owner(
        &self,
        id: &ConversationId,
        owner: ResponseOwner,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        let conversation = inner.conversation_mut(id)?;
        if conversation.is_active() {
            conversation.assign_owner(owner)?;
        } else {
            // Store-level write is last-write-wins; lifecycle rules live in the handlers.
            *conversation = Conversation::reconstitute(
                conversation.id(),
                conversation.owner_ref().map(String::from),
                conversation.session_ref().map(String::from),
                conversation.origin().clone(),
                conversation.status(),
                owner,
                conversation.created_at(),
                Timestamp::now(),
            );
        }
        Ok(())
    }

    async fn close_conversation(&self, id: &ConversationId) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        inner.conversation_mut(id)?.close()?;
        Ok(())
    }

    async fn list_active(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError> {
        let inner = self.inner.read().await;
        let summaries = inner
            .active_by_recency()
            .into_iter()
            .map(|c| inner.summary(c))
            .collect();
        Ok(page(summaries, limit, offset))
    }

    async fn count_active(&self) -> Result<u64, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.conversations.values().filter(|c| c.is_active()).count() as u64)
    }

    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .transcript(conversation_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn last_message(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.transcript(conversation_id).last().map(|m| (*m).clone()))
    }

    async fn statistics(&self, since: Timestamp) -> Result<ConversationStats, DomainError> {
        let inner = self.inner.read().await;
        let conversations = inner.conversations.values();

        let mut daily: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
        for conversation in conversations.clone() {
            if !conversation.created_at().is_before(&since) {
                *daily.entry(conversation.created_at().date()).or_default() += 1;
            }
        }

        Ok(ConversationStats {
            total_conversations: inner.conversations.len() as u64,
            active_conversations: conversations.clone().filter(|c| c.is_active()).count() as u64,
            human_owned_conversations: conversations
                .filter(|c| c.is_active() && c.is_human_owned())
                .count() as u64,
            total_messages: inner.messages.len() as u64,
            daily_new_conversations: daily
                .into_iter()
                .map(|(date, count)| DailyCount { date, count })
                .collect(),
        })
    }

    async fn needing_attention(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AttentionItem>, DomainError> {
        let inner = self.inner.read().await;
        let mut items: Vec<AttentionItem> = inner
            .active_by_recency()
            .into_iter()
            .filter_map(|conversation| {
                let unanswered = inner
                    .transcript(&conversation.id())
                    .iter()
                    .filter(|m| m.is_unanswered_visitor_turn())
                    .count() as u64;
                (conversation.is_human_owned() || unanswered > 0).then(|| AttentionItem {
                    summary: inner.summary(conversation),
                    unanswered_count: unanswered,
                })
            })
            .collect();
        // stable sort keeps the recency order within equal counts
        items.sort_by(|a, b| b.unanswered_count.cmp(&a.unanswered_count));
        Ok(page(items, limit, offset))
    }

    async fn search(
        &self,
        term: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, DomainError> {
        let needle = term.to_lowercase();
        let contains = |value: Option<&str>| {
            value.is_some_and(|v| v.to_lowercase().contains(&needle))
        };

        let inner = self.inner.read().await;
        let matches = inner
            .active_by_recency()
            .into_iter()
            .filter(|conversation| {
                contains(Some(&conversation.origin().client_address))
                    || inner.transcript(&conversation.id()).iter().any(|m| {
                        contains(m.text.as_deref()) || contains(m.response_text.as_deref())
                    })
            })
            .map(|c| inner.summary(c))
            .collect();
        Ok(page(matches, limit, offset))
    }

    async fn purge_closed_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut inner = self.inner.write().await;
        let doomed: Vec<ConversationId> = inner
            .conversations
            .values()
            .filter(|c| !c.is_active() && c.updated_at().is_before(&cutoff))
            .map(|c| c.id())
            .collect();

        for id in &doomed {
            inner.conversations.remove(id);
        }
        inner
            .messages
            .retain(|_, m| !doomed.contains(&m.conversation_id));

        Ok(doomed.len() as u64)
    }
}
