//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion providers (OpenAI, scripted)
//! - `postgres` - PostgreSQL conversation store
//! - `storage` - In-memory store and visitor directory
//! - `http` - axum REST API

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;

pub use ai::{OpenAiCompletionClient, ScriptedCompletionClient};
pub use postgres::PostgresConversationStore;
pub use storage::{InMemoryConversationStore, InMemoryVisitorDirectory};
