//! Support Chat - Customer-support chat backend
//!
//! Visitor messages are answered by an LLM completion provider unless a human
//! agent has taken the conversation over. Long answers are split into
//! several chat bubbles revealed with a simulated typing delay. Agents use
//! the admin API to list, search, take over, answer and close conversations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
