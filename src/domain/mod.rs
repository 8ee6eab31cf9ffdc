//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `conversation` - Conversation aggregate, messages, response splitting and pacing

pub mod conversation;
pub mod foundation;
