//! Dashboard statistics.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{ConversationStats, ConversationStore};

/// Days covered by the daily new-conversation counts.
pub const STATS_WINDOW_DAYS: i64 = 7;

pub struct GetStatisticsHandler {
    store: Arc<dyn ConversationStore>,
}

impl GetStatisticsHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self) -> Result<ConversationStats, DomainError> {
        let since = Timestamp::now().minus_days(STATS_WINDOW_DAYS);
        self.store.statistics(since).await
    }
}
