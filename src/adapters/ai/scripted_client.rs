//! Scripted Completion Client for tests and local development.
//!
//! Replays queued results in order and records every request it receives.
//! When the queue is empty it falls back to a default reply, or to an
//! upstream error if none is set.
//!
//! # Example
//!
//! ```ignore
//! let client = ScriptedCompletionClient::new()
//!     .with_reply("Hello! How can I help?")
//!     .with_error(CompletionError::MissingCredential);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::ports::{CompletionClient, CompletionError, CompletionRequest, UpstreamErrorKind};

/// Completion client with queued, pre-configured results.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCompletionClient {
    script: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    default_reply: Option<String>,
    delay: Duration,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful completion.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: CompletionError) -> Self {
        self.push(Err(error));
        self
    }

    /// Reply used once the queue is exhausted.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = Some(reply.into());
        self
    }

    /// Simulated provider latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues another result on a shared client.
    pub fn push(&self, result: Result<String, CompletionError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(result) => result,
            None => self.default_reply.clone().ok_or_else(|| {
                CompletionError::upstream(UpstreamErrorKind::Provider, "no scripted completion left")
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::new("sys", vec![], text)
    }

    #[tokio::test]
    async fn replays_results_in_order() {
        let client = ScriptedCompletionClient::new()
            .with_reply("first")
            .with_error(CompletionError::MissingCredential);

        assert_eq!(client.complete(request("a")).await, Ok("first".to_string()));
        assert_eq!(
            client.complete(request("b")).await,
            Err(CompletionError::MissingCredential)
        );
    }

    #[tokio::test]
    async fn records_requests() {
        let client = ScriptedCompletionClient::new().with_default_reply("ok");

        client.complete(request("one")).await.unwrap();
        client.complete(request("two")).await.unwrap();

        assert_eq!(client.call_count(), 2);
        assert_eq!(client.last_request().unwrap().new_message, "two");
        assert_eq!(client.requests()[0].new_message, "one");
    }

    #[tokio::test]
    async fn empty_script_without_default_is_an_error() {
        let client = ScriptedCompletionClient::new();
        assert!(matches!(
            client.complete(request("x")).await,
            Err(CompletionError::Upstream { .. })
        ));
    }

    #[tokio::test]
    async fn clones_share_script_and_history() {
        let client = ScriptedCompletionClient::new();
        let handle = client.clone();
        handle.push(Ok("shared".to_string()));

        assert_eq!(client.complete(request("x")).await, Ok("shared".to_string()));
        assert_eq!(handle.call_count(), 1);
    }
}
