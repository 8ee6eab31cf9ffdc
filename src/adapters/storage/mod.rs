//! Storage Adapters
//!
//! Non-database implementations of the `ConversationStore` and
//! `VisitorDirectory` ports.
//!
//! ## Available Adapters
//!
//! - **InMemoryConversationStore** - Stores conversations in memory (testing/development)
//! - **InMemoryVisitorDirectory** - Visitor profiles keyed by `owner_ref`
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::InMemoryConversationStore;
//!
//! let store = Arc::new(InMemoryConversationStore::new());
//! ```

mod in_memory_conversation_store;
mod in_memory_visitor_directory;

pub use in_memory_conversation_store::InMemoryConversationStore;
pub use in_memory_visitor_directory::InMemoryVisitorDirectory;
