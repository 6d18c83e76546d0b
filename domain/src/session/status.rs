//! Session state machine.
//!
//! ```text
//! pending ──start──▶ active ──pause──▶ paused
//!                      ▲  ◀──resume───  │
//!                      │                │
//!                      └──conclude──▶ concluded ◀──conclude──┘
//! ```
//!
//! Every command is validated against the current status and yields a typed
//! result; `concluded` is terminal.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a discussion session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Active,
    Paused,
    Concluded,
}

/// Commands that act on a session's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Conclude,
    SubmitHumanMessage,
}

impl SessionCommand {
    pub fn as_str(&self) -> &str {
        match self {
            SessionCommand::Start => "start",
            SessionCommand::Pause => "pause",
            SessionCommand::Resume => "resume",
            SessionCommand::Conclude => "conclude",
            SessionCommand::SubmitHumanMessage => "submit a human message to",
        }
    }
}

impl std::fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Concluded => "concluded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Concluded)
    }

    /// Validate `command` against this status and return the resulting status.
    ///
    /// `SubmitHumanMessage` never changes the status.
    pub fn apply(self, command: SessionCommand) -> Result<SessionStatus, DomainError> {
        use SessionCommand as C;
        use SessionStatus as S;

        match (self, command) {
            (S::Pending, C::Start) => Ok(S::Active),
            (S::Active, C::Pause) => Ok(S::Paused),
            (S::Paused, C::Resume) => Ok(S::Active),
            (S::Active | S::Paused, C::Conclude) => Ok(S::Concluded),
            (S::Active | S::Paused, C::SubmitHumanMessage) => Ok(self),
            (status, command) => Err(DomainError::InvalidTransition { status, command }),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
