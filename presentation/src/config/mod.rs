//! Presentation-level configuration
//!
//! Resolves how a run is rendered from CLI flags and the `[output]` section.

use crate::cli::commands::OutputFormat;

/// How live progress is rendered while a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// indicatif bar with messages printed above it
    Bar,
    /// Plain lines, safe to interleave with typed input
    Lines,
    Silent,
}

/// Output configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    pub progress: ProgressMode,
    /// Stream messages while the session runs
    pub live_messages: bool,
}

impl OutputConfig {
    /// CLI flags win over the config file
    pub fn resolve(
        cli_format: Option<OutputFormat>,
        file_format: Option<&str>,
        color: bool,
        quiet: bool,
        interactive: bool,
    ) -> Self {
        let format = cli_format
            .or_else(|| file_format.and_then(|f| f.parse().ok()))
            .unwrap_or_default();
        let progress = if quiet {
            ProgressMode::Silent
        } else if interactive {
            ProgressMode::Lines
        } else {
            ProgressMode::Bar
        };
        Self {
            format,
            color,
            progress,
            live_messages: format != OutputFormat::Json,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::resolve(None, None, true, false, false)
    }
}
