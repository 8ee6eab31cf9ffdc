//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CompletionClient` - External text-generation service
//! - `ConversationStore` - Persistence of conversations and messages
//! - `VisitorDirectory` - Optional visitor personalization lookup

mod completion_client;
mod conversation_store;
mod visitor_directory;

pub use completion_client::{
    ChatMessage, ChatRole, CompletionClient, CompletionError, CompletionRequest, HistoryEntry,
    UpstreamErrorKind, DEFAULT_HISTORY_LIMIT,
};
pub use conversation_store::{
    AttentionItem, ConversationStats, ConversationStore, ConversationSummary, DailyCount,
};
pub use visitor_directory::VisitorDirectory;
