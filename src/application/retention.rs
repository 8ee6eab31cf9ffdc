//! Retention sweep for closed conversations.
//!
//! Closed conversations whose `updated_at` is older than the retention age
//! are deleted along with their messages. The sweep runs on an interval in
//! the background until shutdown is broadcast.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::ConversationStore;

/// Deletes closed conversations past their retention age.
pub struct RetentionSweeper {
    store: Arc<dyn ConversationStore>,
    retention_days: u32,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn ConversationStore>, retention_days: u32) -> Self {
        Self {
            store,
            retention_days,
        }
    }

    /// Runs one sweep and returns the number of conversations deleted.
    pub async fn sweep(&self) -> Result<u64, DomainError> {
        let cutoff = Timestamp::now().minus_days(i64::from(self.retention_days));
        let deleted = self.store.purge_closed_before(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, retention_days = self.retention_days, "Retention sweep removed conversations");
        } else {
            tracing::debug!("Retention sweep found nothing to remove");
        }
        Ok(deleted)
    }
}

/// Sweeps every `interval` until a shutdown signal arrives.
///
/// The first sweep happens immediately. Failures are logged and the loop
/// keeps going.
pub async fn run_retention_loop(
    sweeper: RetentionSweeper,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = interval.as_secs(),
        retention_days = sweeper.retention_days,
        "Retention loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = sweeper.sweep().await {
                    tracing::error!(error = %e, "Retention sweep failed");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Retention loop shutting down");
                break;
            }
        }
    }
}
