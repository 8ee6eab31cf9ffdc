//! Conversation command and query handlers.
//!
//! Visitor messaging, agent ownership changes and replies, closing, and the
//! active listing with transcripts.

mod close_conversation;
mod get_conversation;
mod human_response;
mod list_active;
mod ownership;
mod send_message;

pub use send_message::{
    AdditionalResponse, SendMessageCommand, SendMessageError, SendMessageHandler,
    SendMessageResult, SendMessageSettings, SendMessageStatus,
};

pub use ownership::{ChangeOwnerCommand, ChangeOwnerHandler, ChangeOwnerResult, OwnershipError};

pub use human_response::{HumanResponseCommand, HumanResponseError, HumanResponseHandler};

pub use close_conversation::{
    CloseConversationCommand, CloseConversationHandler, CloseConversationResult,
};

pub use get_conversation::{ConversationDetail, GetConversationHandler, GetConversationQuery};
pub use list_active::{ListActiveHandler, ListActiveQuery};
