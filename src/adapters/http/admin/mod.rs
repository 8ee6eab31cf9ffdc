//! HTTP adapter for the admin console.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CloseResponse, ConversationDetailResponse, ConversationResponse, ConversationSummaryResponse,
    MessageResponse, OwnershipResponse, PageResponse, StatsResponse,
};
pub use handlers::AdminHandlers;
pub use routes::admin_routes;
