//! Progressive reveal of multi-part answers.
//!
//! Additional parts are revealed one after another with a simulated typing
//! delay proportional to each part's own length. Order is strict: a part is
//! never sent before the previous one.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Typing-speed model used to schedule additional parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPacing {
    /// Fixed pause before every reveal.
    pub base_delay: Duration,
    /// Time charged per character of the part.
    pub per_char: Duration,
    /// Cap on the length-dependent share of the delay.
    pub max_typing: Duration,
}

impl Default for TypingPacing {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            per_char: Duration::from_millis(20),
            max_typing: Duration::from_millis(2000),
        }
    }
}

impl TypingPacing {
    pub fn new(base_delay: Duration, per_char: Duration, max_typing: Duration) -> Self {
        Self {
            base_delay,
            per_char,
            max_typing,
        }
    }

    /// Delay before revealing `part`, measured from the previous reveal.
    pub fn delay_for(&self, part: &str) -> Duration {
        let chars = u32::try_from(part.chars().count()).unwrap_or(u32::MAX);
        let typing = self.per_char.saturating_mul(chars).min(self.max_typing);
        self.base_delay + typing
    }
}

/// One scheduled reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStep {
    pub content: String,
    pub delay: Duration,
}

/// Ordered reveal schedule for the additional parts of one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealPlan {
    steps: Vec<RevealStep>,
}

impl RevealPlan {
    /// Schedules `parts` in the given order.
    pub fn new<I, S>(parts: I, pacing: &TypingPacing) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let steps = parts
            .into_iter()
            .map(|part| {
                let content = part.into();
                let delay = pacing.delay_for(&content);
                RevealStep { content, delay }
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[RevealStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of all delays.
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.delay).sum()
    }

    /// Plays the plan: waits each step's delay, then sends its content.
    ///
    /// Server-side playback for embedding code that delivers parts over its
    /// own channel. The HTTP widget does not use this; it replays the
    /// `delayMs` values from the send-message response instead.
    ///
    /// Stops early and returns the number of parts delivered if the receiver
    /// goes away.
    pub async fn play(self, sender: mpsc::Sender<String>) -> usize {
        let mut delivered = 0;
        for step in self.steps {
            tokio::time::sleep(step.delay).await;
            if sender.send(step.content).await.is_err() {
                tracing::debug!(delivered, "reveal receiver dropped");
                break;
            }
            delivered += 1;
        }
        delivered
    }
}
