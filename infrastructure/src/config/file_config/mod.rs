//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. String-typed enum fields
//! are parsed with a fallback and reported through [`FileConfig::validate`].

mod discussion;
mod gateway;
mod logging;
mod output;
mod persistence;
mod scheduler;

pub use discussion::{FileDiscussionConfig, FileParticipantConfig};
pub use gateway::{FileGatewayConfig, GatewayProvider};
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, OUTPUT_FORMATS};
pub use persistence::{FilePersistenceConfig, PersistenceBackend};
pub use scheduler::FileSchedulerConfig;

use super::validation::{ConfigIssue, ConfigIssueCode};
use roundtable_application::OrchestratorConfig;
use roundtable_domain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults for new sessions
    pub discussion: FileDiscussionConfig,
    /// Turn timing and pause behavior
    pub scheduler: FileSchedulerConfig,
    /// Failed-turn retry budget
    pub retry: RetryPolicy,
    /// Completion endpoint
    pub gateway: FileGatewayConfig,
    /// Session storage
    pub persistence: FilePersistenceConfig,
    /// Log file
    pub logging: FileLoggingConfig,
    /// Result rendering
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.discussion.validate());
        issues.extend(self.scheduler.validate());
        issues.extend(self.gateway.validate());
        issues.extend(self.persistence.validate());
        issues.extend(self.output.validate());

        if self.retry.max_backoff_ms < self.retry.base_backoff_ms {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "retry.max_backoff_ms".to_string(),
                },
                format!(
                    "retry.max_backoff_ms ({}) is below retry.base_backoff_ms ({}); every wait is capped at {}ms",
                    self.retry.max_backoff_ms, self.retry.base_backoff_ms, self.retry.max_backoff_ms
                ),
            ));
        }
        issues
    }

    /// Orchestrator settings, with unparseable values replaced by defaults
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        let (pause_policy, _) = self.scheduler.parse_pause_policy();
        OrchestratorConfig::default()
            .with_context_window(self.discussion.context_window)
            .with_default_max_rounds(self.discussion.max_rounds)
            .with_turn_timeout(Duration::from_secs(self.scheduler.turn_timeout_secs))
            .with_summary_timeout(Duration::from_secs(self.scheduler.summary_timeout_secs))
            .with_pause_policy(pause_policy)
            .with_event_capacity(self.scheduler.event_capacity)
            .with_retry(self.retry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_application::PausePolicy;
    use roundtable_domain::{ParticipantRole, SessionType};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[discussion]
max_rounds = 3
session_type = "plot_creation"
context_window = 12
project = "harbour-novel"

[[discussion.participants]]
role = "writer"
display_name = "Mara"
style = "spare, concrete"
traits = { creativity = 0.9 }

[[discussion.participants]]
role = "editor"

[[discussion.participants]]
role = "dramaturg"

[scheduler]
turn_timeout_secs = 30
pause_policy = "finish_in_flight"

[retry]
max_retries = 1
base_backoff_ms = 100

[gateway]
provider = "scripted"

[persistence]
backend = "jsonl"
dir = "/tmp/roundtable"

[logging]
file = "/tmp/roundtable.log"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.discussion.max_rounds, 3);
        assert_eq!(config.discussion.project.as_deref(), Some("harbour-novel"));
        assert_eq!(config.discussion.parse_session_type().0, SessionType::PlotCreation);

        let (roster, issues) = config.discussion.parse_participants();
        assert!(issues.is_empty());
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].personality.display_name.as_deref(), Some("Mara"));
        assert_eq!(roster[2].role, ParticipantRole::Custom("dramaturg".to_string()));

        assert_eq!(config.scheduler.turn_timeout_secs, 30);
        // Unset keys keep their defaults
        assert_eq!(config.scheduler.summary_timeout_secs, 120);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.max_backoff_ms, RetryPolicy::default().max_backoff_ms);
        assert_eq!(config.gateway.provider, GatewayProvider::Scripted);
        assert_eq!(config.persistence.backend, PersistenceBackend::Jsonl);
        assert!(config.logging.file.is_some());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[discussion]\nmax_rounds = 8\n").unwrap();
        assert_eq!(config.discussion.max_rounds, 8);
        assert_eq!(config.discussion.participants.len(), 2);
        assert_eq!(config.gateway.provider, GatewayProvider::Openai);
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().iter().all(|issue| !issue.is_error()));
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let toml_str = r#"
[discussion]
max_rounds = 0
session_type = "brainstorm"

[[discussion.participants]]
role = "writer"

[scheduler]
turn_timeout_secs = 0
pause_policy = "freeze"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();

        let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
        let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error()).collect();
        // roster too small, max_rounds 0, turn timeout 0
        assert_eq!(errors.len(), 3);
        // unknown session type, unknown pause policy
        assert_eq!(warnings.len(), 2);
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::InvalidEnumValue { field, .. } if field == "scheduler.pause_policy"
        )));
    }

    #[test]
    fn test_duplicate_participants_rejected() {
        let toml_str = r#"
[[discussion.participants]]
role = "editor"

[[discussion.participants]]
role = "Editor"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.discussion.validate();
        assert!(issues.iter().any(|i| i.code == ConfigIssueCode::InvalidRoster));
    }

    #[test]
    fn test_to_orchestrator_config() {
        let toml_str = r#"
[discussion]
max_rounds = 4
context_window = 6

[scheduler]
turn_timeout_secs = 45
summary_timeout_secs = 15
pause_policy = "finish-in-flight"
event_capacity = 64

[retry]
max_retries = 2
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let orchestrator = config.to_orchestrator_config();
        assert_eq!(orchestrator.default_max_rounds, 4);
        assert_eq!(orchestrator.context_window, 6);
        assert_eq!(orchestrator.turn_timeout, Duration::from_secs(45));
        assert_eq!(orchestrator.summary_timeout, Duration::from_secs(15));
        assert_eq!(orchestrator.pause_policy, PausePolicy::FinishInFlight);
        assert_eq!(orchestrator.event_capacity, 64);
        assert_eq!(orchestrator.retry.max_retries, 2);
    }

    #[test]
    fn test_inverted_backoff_warns() {
        let mut config = FileConfig::default();
        config.retry.base_backoff_ms = 5_000;
        config.retry.max_backoff_ms = 1_000;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }
}
