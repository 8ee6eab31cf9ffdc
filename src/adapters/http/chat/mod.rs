//! HTTP adapter for the visitor widget.

mod dto;
mod handlers;
mod routes;

pub use dto::{AdditionalResponseDto, SendMessageRequest, SendMessageResponse, SettingsQuery};
pub use handlers::ChatHandlers;
pub use routes::chat_routes;
