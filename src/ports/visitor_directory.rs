//! Visitor directory port.
//!
//! Resolves an authenticated visitor's `owner_ref` to a profile used for
//! prompt personalization and the welcome message.

use async_trait::async_trait;

use crate::domain::conversation::VisitorProfile;
use crate::domain::foundation::DomainError;

/// Lookup of known visitors.
#[async_trait]
pub trait VisitorDirectory: Send + Sync {
    /// Returns `None` for unknown visitors.
    async fn profile(&self, owner_ref: &str) -> Result<Option<VisitorProfile>, DomainError>;
}
