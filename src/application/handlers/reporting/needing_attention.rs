//! Conversations an agent should look at: human-owned, or with an
//! unanswered visitor message.

use std::sync::Arc;

use crate::application::handlers::paging::{Page, PageRequest};
use crate::domain::foundation::DomainError;
use crate::ports::{AttentionItem, ConversationStore};

#[derive(Debug, Clone, Copy, Default)]
pub struct NeedingAttentionQuery {
    pub page: PageRequest,
}

pub struct NeedingAttentionHandler {
    store: Arc<dyn ConversationStore>,
}

impl NeedingAttentionHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: NeedingAttentionQuery) -> Result<Page<AttentionItem>, DomainError> {
        let items = self
            .store
            .needing_attention(query.page.limit(), query.page.offset())
            .await?;
        Ok(Page::new(items, query.page))
    }
}
