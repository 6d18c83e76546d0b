//! Application-level configuration.
//!
//! - [`OrchestratorConfig`] — scheduling loop control (context window, timeouts, retries)
//! - [`PausePolicy`] — what a pause does with an in-flight turn

pub mod orchestrator_config;

pub use orchestrator_config::{OrchestratorConfig, PausePolicy};
