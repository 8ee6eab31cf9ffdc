//! ListActiveConversations query handler.

use std::sync::Arc;

use crate::application::handlers::paging::{Page, PageRequest};
use crate::domain::foundation::DomainError;
use crate::ports::{ConversationStore, ConversationSummary};

#[derive(Debug, Clone, Copy, Default)]
pub struct ListActiveQuery {
    pub page: PageRequest,
}

/// Active conversations, most recently updated first, each with its last message.
pub struct ListActiveHandler {
    store: Arc<dyn ConversationStore>,
}

impl ListActiveHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: ListActiveQuery) -> Result<Page<ConversationSummary>, DomainError> {
        let items = self
            .store
            .list_active(query.page.limit(), query.page.offset())
            .await?;
        let total = self.store.count_active().await?;
        Ok(Page::new(items, query.page).with_total(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryConversationStore;
    use crate::domain::conversation::NewConversation;

    #[tokio::test]
    async fn pages_through_active_conversations() {
        let store = Arc::new(InMemoryConversationStore::new());
        for i in 0..3 {
            let id = store.create_conversation(NewConversation::default()).await.unwrap().id();
            store.append_message(&id, &format!("message {i}")).await.unwrap();
        }
        let handler = ListActiveHandler::new(store);

        let first = handler
            .handle(ListActiveQuery { page: PageRequest::new(Some(1), Some(2)) })
            .await
            .unwrap();
        let second = handler
            .handle(ListActiveQuery { page: PageRequest::new(Some(2), Some(2)) })
            .await
            .unwrap();

        assert_eq!(first.items.len(), 2);
        assert_eq!(second.items.len(), 1);
        assert_eq!(first.total, Some(3));
        assert!(first.items.iter().all(|s| s.last_message.is_some()));
    }

    #[tokio::test]
    async fn closed_conversations_are_excluded() {
        let store = Arc::new(InMemoryConversationStore::new());
        let open = store.create_conversation(NewConversation::default()).await.unwrap().id();
        let closed = store.create_conversation(NewConversation::default()).await.unwrap().id();
        store.close_conversation(&closed).await.unwrap();
        let handler = ListActiveHandler::new(store);

        let page = handler.handle(ListActiveQuery::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].conversation.id(), open);
        assert_eq!(page.total, Some(1));
    }
}
