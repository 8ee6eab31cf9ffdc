//! HTTP middleware for axum.
//!
//! - `admin_auth` - Bearer token check guarding the admin routes

pub mod admin_auth;

pub use admin_auth::{admin_auth_middleware, AdminAuthState};
