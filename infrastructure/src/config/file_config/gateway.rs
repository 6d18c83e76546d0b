//! Completion gateway configuration from TOML (`[gateway]` section)

use crate::config::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// Which completion gateway adapter serves the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayProvider {
    /// Any OpenAI-compatible `/chat/completions` endpoint
    #[default]
    Openai,
    /// Deterministic offline replies, no network
    Scripted,
}

impl GatewayProvider {
    pub fn as_str(&self) -> &str {
        match self {
            GatewayProvider::Openai => "openai",
            GatewayProvider::Scripted => "scripted",
        }
    }
}

/// Raw gateway configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub provider: GatewayProvider,
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    /// Max tokens per turn response
    pub max_tokens: u32,
    pub temperature: f32,
    /// Simulated thinking time per scripted turn
    pub scripted_delay_ms: u64,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::default(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 800,
            temperature: 0.8,
            scripted_delay_ms: 400,
        }
    }
}

impl FileGatewayConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.provider == GatewayProvider::Scripted {
            return issues;
        }
        if self.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "gateway.model".to_string(),
                },
                "gateway.model cannot be empty",
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidEnumValue {
                    field: "gateway.base_url".to_string(),
                    value: self.base_url.clone(),
                    valid_values: vec!["http://...".to_string(), "https://...".to_string()],
                },
                format!("gateway.base_url: '{}' is not an http(s) URL", self.base_url),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "gateway.temperature".to_string(),
                },
                format!(
                    "gateway.temperature: {} is outside [0, 2]; the endpoint may reject it",
                    self.temperature
                ),
            ));
        }
        issues
    }
}
