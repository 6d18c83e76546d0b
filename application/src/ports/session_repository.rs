//! Port for durable session storage.
//!
//! The orchestrator treats the repository as a write-through sink: every
//! lifecycle change saves a session snapshot and every appended message is
//! handed over individually. The in-memory session stays authoritative, so
//! a failing repository degrades persistence without stopping the session.
//!
//! Methods are synchronous; they are called while the session lock is held
//! and must not block for long.

use roundtable_domain::{DiscussionSession, Message, SessionId, SessionSummary};
use thiserror::Error;

/// Errors raised by repository adapters
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record in {source_name}: {reason}")]
    Corrupt { source_name: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage and retrieval of sessions and their message logs
pub trait SessionRepository: Send + Sync {
    /// Store a full snapshot of the session (status, round, participants, log)
    fn save_session(&self, session: &DiscussionSession) -> Result<(), PersistenceError>;

    /// Store one newly appended message
    fn append_message(&self, message: &Message) -> Result<(), PersistenceError>;

    /// Rebuild a session, or `None` if it was never stored
    fn load_session(&self, id: &SessionId) -> Result<Option<DiscussionSession>, PersistenceError>;

    /// Summaries of stored sessions, optionally filtered by project
    fn list_sessions(&self, project_id: Option<&str>) -> Result<Vec<SessionSummary>, PersistenceError>;
}

/// Repository that stores nothing. Used when persistence is disabled.
pub struct NoPersistence;

impl SessionRepository for NoPersistence {
    fn save_session(&self, _session: &DiscussionSession) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn append_message(&self, _message: &Message) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn load_session(&self, _id: &SessionId) -> Result<Option<DiscussionSession>, PersistenceError> {
        Ok(None)
    }

    fn list_sessions(&self, _project_id: Option<&str>) -> Result<Vec<SessionSummary>, PersistenceError> {
        Ok(Vec::new())
    }
}
