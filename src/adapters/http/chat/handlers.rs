//! HTTP handlers for the visitor widget endpoints.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{domain_error_response, ErrorResponse};
use crate::application::handlers::{
    GetWidgetSettingsHandler, GetWidgetSettingsQuery, SendMessageCommand, SendMessageError,
    SendMessageHandler,
};
use crate::domain::conversation::OriginInfo;

use super::dto::{SendMessageRequest, SendMessageResponse, SettingsQuery};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ChatHandlers {
    send_message: Arc<SendMessageHandler>,
    settings: Arc<GetWidgetSettingsHandler>,
}

impl ChatHandlers {
    pub fn new(send_message: Arc<SendMessageHandler>, settings: Arc<GetWidgetSettingsHandler>) -> Self {
        Self {
            send_message,
            settings,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/chat/settings - Widget configuration and greeting
pub async fn get_settings(
    State(handlers): State<ChatHandlers>,
    Query(query): Query<SettingsQuery>,
) -> Response {
    let settings = handlers
        .settings
        .handle(GetWidgetSettingsQuery {
            owner_ref: query.owner_ref,
        })
        .await;
    (StatusCode::OK, Json(settings)).into_response()
}

/// POST /api/chat/messages - Send a visitor message
pub async fn send_message(
    State(handlers): State<ChatHandlers>,
    headers: HeaderMap,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let cmd = SendMessageCommand {
        conversation_id: req
            .conversation_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok()),
        text: req.message,
        owner_ref: req.owner_ref.filter(|r| !r.trim().is_empty()),
        session_ref: req.session_ref.filter(|r| !r.trim().is_empty()),
        origin: client_origin(&headers),
    };

    // Detached: a dropped connection or request timeout must not cancel the
    // completion before its result is persisted.
    let handler = handlers.send_message.clone();
    let outcome = tokio::spawn(async move { handler.handle(cmd).await }).await;

    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, Json(SendMessageResponse::from(result))).into_response(),
        Ok(Err(e)) => handle_send_error(e),
        Err(join_error) => {
            tracing::error!(error = %join_error, "send message task failed");
            ErrorResponse::internal("An internal error occurred")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

/// Client address from `X-Forwarded-For` (first hop), then `X-Real-IP`.
/// Anything that does not parse as an IP becomes `0.0.0.0`.
pub(crate) fn client_origin(headers: &HeaderMap) -> OriginInfo {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let forwarded = header("x-forwarded-for").and_then(|v| v.split(',').next());
    let candidate = forwarded.or_else(|| header("x-real-ip"));
    let address = candidate
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| OriginInfo::UNKNOWN_ADDRESS.to_string());

    let agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    OriginInfo::new(address, agent)
}

fn handle_send_error(error: SendMessageError) -> Response {
    match error {
        SendMessageError::ChatDisabled => ErrorResponse::forbidden("Chat is currently disabled")
            .into_response_with(StatusCode::FORBIDDEN),
        SendMessageError::EmptyMessage => ErrorResponse::bad_request("Message cannot be empty")
            .into_response_with(StatusCode::BAD_REQUEST),
        SendMessageError::Store(e) => domain_error_response(e),
    }
}
