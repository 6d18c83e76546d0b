//! Orchestrator parameters — scheduling loop control.
//!
//! [`OrchestratorConfig`] groups the static parameters the
//! [`DiscussionOrchestrator`](crate::use_cases::orchestrator::DiscussionOrchestrator)
//! applies to every session it runs. Per-session choices (topic, roster,
//! round limit) travel in
//! [`StartSessionInput`](crate::use_cases::orchestrator::StartSessionInput).

use roundtable_domain::{DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_ROUNDS, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::events::DEFAULT_EVENT_CAPACITY;

/// What `pause` does with a turn that is already waiting on the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Cancel the call; the same participant is asked again on resume.
    #[default]
    CancelInFlight,
    /// Let the call finish and keep its message, then stop scheduling.
    FinishInFlight,
}

impl PausePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            PausePolicy::CancelInFlight => "cancel_in_flight",
            PausePolicy::FinishInFlight => "finish_in_flight",
        }
    }
}

impl std::str::FromStr for PausePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "cancel_in_flight" | "cancel" => Ok(PausePolicy::CancelInFlight),
            "finish_in_flight" | "finish" => Ok(PausePolicy::FinishInFlight),
            other => Err(format!(
                "unknown pause policy '{}', expected cancel_in_flight or finish_in_flight",
                other
            )),
        }
    }
}

/// Scheduling parameters shared by every session of an orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Messages of history included in each turn context.
    pub context_window: usize,
    /// Upper bound for one gateway turn call; expiry counts as a failure.
    pub turn_timeout: Duration,
    /// Upper bound for the summary call before the local fallback is used.
    pub summary_timeout: Duration,
    pub retry: RetryPolicy,
    pub pause_policy: PausePolicy,
    /// Per-session event channel capacity before slow subscribers lag.
    pub event_capacity: usize,
    /// Round limit used when a start request does not carry one.
    pub default_max_rounds: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            turn_timeout: Duration::from_secs(120),
            summary_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            pause_policy: PausePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            default_max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        self.summary_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pause_policy(mut self, policy: PausePolicy) -> Self {
        self.pause_policy = policy;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_default_max_rounds(mut self, rounds: u32) -> Self {
        self.default_max_rounds = rounds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.context_window, 20);
        assert_eq!(config.default_max_rounds, 5);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.pause_policy, PausePolicy::CancelInFlight);
    }

    #[test]
    fn test_builder_chain() {
        let config = OrchestratorConfig::default()
            .with_context_window(8)
            .with_turn_timeout(Duration::from_secs(5))
            .with_pause_policy(PausePolicy::FinishInFlight)
            .with_retry(RetryPolicy::default().with_max_retries(1));
        assert_eq!(config.context_window, 8);
        assert_eq!(config.turn_timeout, Duration::from_secs(5));
        assert_eq!(config.pause_policy, PausePolicy::FinishInFlight);
        assert_eq!(config.retry.max_retries, 1);
    }

    #[test]
    fn test_pause_policy_parse() {
        assert_eq!("finish-in-flight".parse(), Ok(PausePolicy::FinishInFlight));
        assert_eq!("cancel".parse(), Ok(PausePolicy::CancelInFlight));
        assert!("wait".parse::<PausePolicy>().is_err());
    }
}
