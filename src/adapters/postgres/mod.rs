//! PostgreSQL adapters - Database implementations for the store port.
//!
//! - `PostgresConversationStore` - Conversations and messages, with embedded
//!   migrations under `migrations/`

mod conversation_store;

pub use conversation_store::PostgresConversationStore;
