//! In-memory VisitorDirectory keyed by `owner_ref`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::VisitorProfile;
use crate::domain::foundation::DomainError;
use crate::ports::VisitorDirectory;

/// Visitor profiles held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVisitorDirectory {
    profiles: Arc<RwLock<HashMap<String, VisitorProfile>>>,
}

impl InMemoryVisitorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the profile for `owner_ref`.
    pub async fn insert(&self, owner_ref: impl Into<String>, profile: VisitorProfile) {
        self.profiles.write().await.insert(owner_ref.into(), profile);
    }
}

#[async_trait]
impl VisitorDirectory for InMemoryVisitorDirectory {
    async fn profile(&self, owner_ref: &str) -> Result<Option<VisitorProfile>, DomainError> {
        Ok(self.profiles.read().await.get(owner_ref).cloned())
    }
}
