//! Persistence configuration from TOML (`[persistence]` section)

use crate::config::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceBackend {
    /// Sessions live only as long as the process
    #[default]
    Memory,
    /// One JSONL file per session under `dir`
    Jsonl,
}

/// Raw persistence configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersistenceConfig {
    pub backend: PersistenceBackend,
    /// Session directory; defaults to the platform data dir
    pub dir: Option<PathBuf>,
}

impl FilePersistenceConfig {
    /// Directory used by the JSONL backend
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("writers-roundtable").join("sessions"))
        })
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.backend == PersistenceBackend::Jsonl && self.resolved_dir().is_none() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "persistence.dir".to_string(),
                },
                "persistence.dir is required: no platform data directory was found",
            ));
        }
        issues
    }
}
