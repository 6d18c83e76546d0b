//! Output configuration from TOML (`[output]` section)

use crate::config::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Formats the binary can render a finished session in
pub const OUTPUT_FORMATS: [&str; 3] = ["transcript", "summary", "json"];

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// transcript | summary | json
    pub format: Option<String>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        match &self.format {
            Some(format) if !OUTPUT_FORMATS.contains(&format.as_str()) => {
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "output.format".to_string(),
                        value: format.clone(),
                        valid_values: OUTPUT_FORMATS.iter().map(|f| f.to_string()).collect(),
                    },
                    format!(
                        "output.format: unknown value '{}', falling back to 'transcript'",
                        format
                    ),
                )]
            }
            _ => Vec::new(),
        }
    }
}
