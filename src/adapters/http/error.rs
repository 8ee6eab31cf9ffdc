//! Error bodies shared by every HTTP area.
//!
//! Errors are returned as `{code, message}` JSON. Infrastructure failures are
//! logged in full and reported to the client with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Pairs the body with a status code.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Maps a domain error onto a status code and error body.
pub fn domain_error_response(error: DomainError) -> Response {
    match error.code() {
        ErrorCode::ValidationFailed => {
            let mut body = ErrorResponse::bad_request(error.message);
            if let Some(field) = error.details.get("field") {
                body = body.with_details(serde_json::json!({ "field": field }));
            }
            body.into_response_with(StatusCode::BAD_REQUEST)
        }
        ErrorCode::ConversationNotFound | ErrorCode::MessageNotFound => {
            ErrorResponse::not_found(error.message).into_response_with(StatusCode::NOT_FOUND)
        }
        ErrorCode::ConversationClosed | ErrorCode::InvalidStateTransition => {
            ErrorResponse::conflict(error.message).into_response_with(StatusCode::CONFLICT)
        }
        ErrorCode::Unauthorized => {
            ErrorResponse::unauthorized(error.message).into_response_with(StatusCode::UNAUTHORIZED)
        }
        ErrorCode::Forbidden => {
            ErrorResponse::forbidden(error.message).into_response_with(StatusCode::FORBIDDEN)
        }
        ErrorCode::DatabaseError | ErrorCode::InternalError => {
            tracing::error!(code = %error.code(), error = %error, "Request failed");
            ErrorResponse::internal("An internal error occurred")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// 400 for a path id that is not a UUID.
pub fn invalid_id_response(raw: &str) -> Response {
    ErrorResponse::bad_request(format!("Invalid conversation ID: {}", raw))
        .into_response_with(StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;

    #[test]
    fn not_found_maps_to_404() {
        let response = domain_error_response(DomainError::conversation_not_found(ConversationId::new()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn closed_conversation_maps_to_409() {
        let response = domain_error_response(DomainError::new(ErrorCode::ConversationClosed, "closed"));
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_maps_to_400() {
        let response = domain_error_response(DomainError::validation("q", "empty"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_error_maps_to_500() {
        let response = domain_error_response(DomainError::database("connection reset"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_serializes_code_and_message() {
        let json = serde_json::to_value(ErrorResponse::conflict("Conversation is closed")).unwrap();
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["message"], "Conversation is closed");
        assert!(json.get("details").is_none());
    }
}
