//! Infrastructure layer for writers-roundtable
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.

pub mod config;
pub mod gateway;
pub mod persistence;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity};
#[cfg(feature = "http-gateway")]
pub use gateway::OpenAiCompletionGateway;
pub use gateway::{ScriptedCompletionGateway, build_gateway};
pub use persistence::{InMemorySessionRepository, JsonlSessionRepository, build_repository};
