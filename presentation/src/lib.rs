//! Presentation layer for writers-roundtable
//!
//! This crate contains CLI definitions, output formatters,
//! event-driven progress reporters, and the interactive operator console.

pub mod cli;
pub mod config;
pub mod interactive;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat, parse_participant};
pub use config::{OutputConfig, ProgressMode};
pub use interactive::{ConsoleCommand, ConsoleExit, InteractiveConsole};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{
    EventObserver, NameMap, ProgressReporter, SilentProgress, SimpleProgress, follow_events,
    wait_for_auto_pause,
};
