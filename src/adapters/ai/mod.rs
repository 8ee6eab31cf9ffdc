//! Completion client adapters.
//!
//! - `OpenAiCompletionClient` - Chat Completions API over `reqwest`
//! - `ScriptedCompletionClient` - Queued replies for tests and local runs

mod openai_client;
mod scripted_client;

pub use openai_client::{OpenAiCompletionClient, FALLBACK_UPSTREAM_MESSAGE};
pub use scripted_client::ScriptedCompletionClient;
