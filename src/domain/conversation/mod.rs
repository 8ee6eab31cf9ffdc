//! Conversation domain module.
//!
//! Conversation lifecycle and ownership, stored messages, the response
//! splitter, reveal pacing and system prompt composition.

mod aggregate;
mod delivery;
mod message;
mod prompt;
mod splitter;
mod state;

pub use aggregate::{Conversation, NewConversation, OriginInfo};
pub use delivery::{RevealPlan, RevealStep, TypingPacing};
pub use message::Message;
pub use prompt::{
    compose_system_prompt, welcome_message, OrderItem, OrderSummary, VisitorProfile,
    NAME_PLACEHOLDER,
};
pub use splitter::{count_words, split_sentences, ResponseSplitter, DEFAULT_WORD_LIMIT};
pub use state::{ConversationStatus, ResponseOwner};
