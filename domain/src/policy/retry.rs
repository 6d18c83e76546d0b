//! Retry policy — how a failing turn is retried and when it escalates.
//!
//! [`RetryPolicy`] is a pure decision function over a participant's
//! consecutive failure count. Cancellations never reach it: a turn aborted
//! by a pause is re-attempted without consuming the budget.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Action determined by the retry policy after a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Retry the same participant after waiting `backoff`.
    Retry { attempt: u32, backoff: Duration },
    /// Retry budget exhausted: document the failure and pause the session.
    Escalate,
}

/// Per-turn retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt.
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each further retry.
    pub base_backoff_ms: u64,
    /// Upper bound for any single wait.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    // ==================== Builder Methods ====================

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff_ms = base.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        let ms = self
            .base_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Decide what happens after the `consecutive_failures`-th failure in a row.
    ///
    /// Each escalation closes a budget of `max_retries + 1` attempts; the
    /// attempt after a resume starts a fresh budget even though the counter
    /// itself is only reset by a successful turn.
    pub fn on_failure(&self, consecutive_failures: u32) -> FailureAction {
        let budget = self.max_retries + 1;
        let position = (consecutive_failures.max(1) - 1) % budget + 1;
        if position >= budget {
            FailureAction::Escalate
        } else {
            FailureAction::Retry {
                attempt: position,
                backoff: self.backoff(position),
            }
        }
    }
}
