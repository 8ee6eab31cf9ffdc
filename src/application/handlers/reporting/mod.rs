//! Admin reporting queries: attention queue, search and statistics.

mod needing_attention;
mod search;
mod statistics;

pub use needing_attention::{NeedingAttentionHandler, NeedingAttentionQuery};
pub use search::{SearchConversationsHandler, SearchConversationsQuery};
pub use statistics::{GetStatisticsHandler, STATS_WINDOW_DAYS};
