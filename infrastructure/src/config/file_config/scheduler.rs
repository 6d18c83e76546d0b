//! Scheduler configuration from TOML (`[scheduler]` section)

use crate::config::validation::{ConfigIssue, ConfigIssueCode};
use roundtable_application::{PausePolicy, events::DEFAULT_EVENT_CAPACITY};
use serde::{Deserialize, Serialize};

/// Raw scheduler configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchedulerConfig {
    /// Seconds a single turn may take before it counts as failed
    pub turn_timeout_secs: u64,
    /// Seconds the summary call may take before the local fallback is used
    pub summary_timeout_secs: u64,
    /// cancel_in_flight | finish_in_flight
    pub pause_policy: String,
    /// Buffered events per session before slow subscribers lag
    pub event_capacity: usize,
}

impl Default for FileSchedulerConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: 120,
            summary_timeout_secs: 120,
            pause_policy: PausePolicy::default().as_str().to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl FileSchedulerConfig {
    pub fn parse_pause_policy(&self) -> (PausePolicy, Vec<ConfigIssue>) {
        match self.pause_policy.parse::<PausePolicy>() {
            Ok(policy) => (policy, Vec::new()),
            Err(_) => (
                PausePolicy::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "scheduler.pause_policy".to_string(),
                        value: self.pause_policy.clone(),
                        valid_values: vec![
                            "cancel_in_flight".to_string(),
                            "finish_in_flight".to_string(),
                        ],
                    },
                    format!(
                        "scheduler.pause_policy: unknown value '{}', falling back to 'cancel_in_flight'",
                        self.pause_policy
                    ),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_pause_policy().1;
        for (field, value) in [
            ("scheduler.turn_timeout_secs", self.turn_timeout_secs),
            ("scheduler.summary_timeout_secs", self.summary_timeout_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: field.to_string(),
                    },
                    format!("{} cannot be 0", field),
                ));
            }
        }
        if self.event_capacity == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "scheduler.event_capacity".to_string(),
                },
                "scheduler.event_capacity cannot be 0",
            ));
        }
        issues
    }
}
