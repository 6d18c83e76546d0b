//! Domain error types

use crate::session::status::{SessionCommand, SessionStatus};
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot {command} a session that is {status}")]
    InvalidTransition {
        status: SessionStatus,
        command: SessionCommand,
    },

    #[error("Session is concluded and can no longer change")]
    SessionConcluded,

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Out-of-order message: expected sequence {expected}, got {got}")]
    SequenceMismatch { expected: u64, got: u64 },
}

impl DomainError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        DomainError::InvalidConfiguration(msg.into())
    }

    /// Check if this error was caused by bad start parameters
    pub fn is_configuration(&self) -> bool {
        matches!(self, DomainError::InvalidConfiguration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let error = DomainError::InvalidTransition {
            status: SessionStatus::Concluded,
            command: SessionCommand::Pause,
        };
        assert_eq!(error.to_string(), "Cannot pause a session that is concluded");
    }

    #[test]
    fn test_is_configuration_check() {
        assert!(DomainError::invalid_config("too few participants").is_configuration());
        assert!(!DomainError::SessionConcluded.is_configuration());
        assert!(!DomainError::UnknownParticipant("critic".into()).is_configuration());
    }
}
