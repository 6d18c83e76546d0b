//! Application layer for writers-roundtable
//!
//! This crate contains the discussion orchestrator, its turn scheduler,
//! the per-session event bus and the port definitions adapters implement.
//! It depends only on the domain layer.

pub mod config;
pub mod events;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{OrchestratorConfig, PausePolicy};
pub use events::{EventBus, SessionEvent, SharedEventBus};
pub use ports::{
    completion_gateway::{CompletionGateway, GatewayError, TurnCompletion, TurnOutcome},
    session_repository::{NoPersistence, PersistenceError, SessionRepository},
};
pub use use_cases::conclusion::fallback_summary;
pub use use_cases::orchestrator::{
    DiscussionOrchestrator, OrchestratorError, SessionHandle, StartSessionInput,
};
