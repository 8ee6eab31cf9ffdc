//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (write) and query handlers (read) are kept separate.

pub mod handlers;
pub mod retention;

pub use handlers::*;
pub use retention::{run_retention_loop, RetentionSweeper};
