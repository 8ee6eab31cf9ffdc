//! Case-insensitive search over active conversations.

use std::sync::Arc;

use crate::application::handlers::paging::{Page, PageRequest};
use crate::domain::foundation::DomainError;
use crate::ports::{ConversationStore, ConversationSummary};

#[derive(Debug, Clone)]
pub struct SearchConversationsQuery {
    pub term: String,
    pub page: PageRequest,
}

pub struct SearchConversationsHandler {
    store: Arc<dyn ConversationStore>,
}

impl SearchConversationsHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Matches message text, response text and client address.
    pub async fn handle(
        &self,
        query: SearchConversationsQuery,
    ) -> Result<Page<ConversationSummary>, DomainError> {
        let term = query.term.trim();
        if term.is_empty() {
            return Err(DomainError::validation("q", "Search term cannot be empty"));
        }

        let items = self
            .store
            .search(term, query.page.limit(), query.page.offset())
            .await?;
        Ok(Page::new(items, query.page))
    }
}
