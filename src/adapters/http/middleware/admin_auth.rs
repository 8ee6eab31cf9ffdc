//! Admin authentication middleware.
//!
//! Admin routes require `Authorization: Bearer <token>` matching the
//! configured admin token. The comparison is constant-time. With no token
//! configured every admin request is rejected.
//!
//! ```text
//! Request → admin_auth_middleware → 401 | admin handler
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::adapters::http::error::ErrorResponse;

/// Expected admin token, if one is configured.
pub type AdminAuthState = Arc<Option<SecretString>>;

pub async fn admin_auth_middleware(
    State(expected): State<AdminAuthState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match (expected.as_ref(), presented) {
        (Some(expected), Some(presented)) if tokens_match(expected, presented) => {
            next.run(request).await
        }
        (None, _) => {
            tracing::warn!("Admin request rejected: no admin token configured");
            unauthorized()
        }
        _ => unauthorized(),
    }
}

fn tokens_match(expected: &SecretString, presented: &str) -> bool {
    expected
        .expose_secret()
        .as_bytes()
        .ct_eq(presented.as_bytes())
        .into()
}

fn unauthorized() -> Response {
    ErrorResponse::unauthorized("Missing or invalid admin credentials")
        .into_response_with(StatusCode::UNAUTHORIZED)
}
