//! HTTP routes for the visitor widget endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_settings, send_message, ChatHandlers};

/// Creates the chat router, mounted under `/api/chat`.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/messages", post(send_message))
        .with_state(handlers)
}
