//! HTTP routes for the admin console endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{admin_auth_middleware, AdminAuthState};

use super::handlers::{
    close, get_conversation, list_active, needing_attention, respond, return_to_ai, search, stats,
    takeover, AdminHandlers,
};

/// Creates the admin router, mounted under `/api/admin`. Every route sits
/// behind the admin token check.
pub fn admin_routes(handlers: AdminHandlers, auth: AdminAuthState) -> Router {
    Router::new()
        .route("/conversations", get(list_active))
        .route("/conversations/attention", get(needing_attention))
        .route("/conversations/search", get(search))
        .route("/conversations/:id", get(get_conversation))
        .route("/conversations/:id/takeover", post(takeover))
        .route("/conversations/:id/return", post(return_to_ai))
        .route("/conversations/:id/respond", post(respond))
        .route("/conversations/:id/close", post(close))
        .route("/stats", get(stats))
        .with_state(handlers)
        .layer(middleware::from_fn_with_state(auth, admin_auth_middleware))
}
