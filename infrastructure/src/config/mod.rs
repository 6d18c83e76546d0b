//! Configuration file loading for writers-roundtable
//!
//! Sources are merged lowest to highest:
//!
//! 1. Built-in defaults
//! 2. Global: `$XDG_CONFIG_HOME/writers-roundtable/config.toml`
//! 3. Project: `./roundtable.toml` or `./.roundtable.toml`
//! 4. `--config <path>`
//! 5. `ROUNDTABLE_*` environment variables (`__` separates nested keys)

mod file_config;
mod loader;
pub mod validation;

pub use file_config::{
    FileConfig, FileDiscussionConfig, FileGatewayConfig, FileLoggingConfig, FileOutputConfig,
    FileParticipantConfig, FilePersistenceConfig, FileSchedulerConfig, GatewayProvider,
    OUTPUT_FORMATS, PersistenceBackend,
};
pub use loader::ConfigLoader;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
