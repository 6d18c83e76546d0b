//! Session event types
//!
//! Every event carries the id of the session that produced it. Consumers
//! treat events as a projection of orchestrator state; nothing downstream
//! is authoritative.

use chrono::{DateTime, Utc};
use roundtable_domain::{
    DiscussionProgress, Message, ParticipantId, ParticipantStatus, SessionId, SessionStatus,
    SessionType,
};
use serde::Serialize;

/// Events published on a session's channel, in production order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "session.started")]
    SessionStarted {
        session_id: SessionId,
        topic: String,
        session_type: SessionType,
        participants: Vec<ParticipantId>,
        max_rounds: u32,
        timestamp: DateTime<Utc>,
    },

    #[serde(rename = "message.appended")]
    MessageAppended { session_id: SessionId, message: Message },

    #[serde(rename = "participant.statusChanged")]
    ParticipantStatusChanged {
        session_id: SessionId,
        participant_id: ParticipantId,
        status: ParticipantStatus,
    },

    #[serde(rename = "progress.updated")]
    ProgressUpdated {
        session_id: SessionId,
        progress: DiscussionProgress,
    },

    /// Pause, resume, or an automatic pause after exhausted retries
    #[serde(rename = "session.statusChanged")]
    SessionStatusChanged {
        session_id: SessionId,
        status: SessionStatus,
        reason: Option<String>,
    },

    #[serde(rename = "session.concluded")]
    SessionConcluded {
        session_id: SessionId,
        summary: String,
        rounds_completed: u32,
        message_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// First repository failure of a session; later failures are silent
    #[serde(rename = "persistence.degraded")]
    PersistenceDegraded { session_id: SessionId, reason: String },
}

impl SessionEvent {
    /// Wire name of the event
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session.started",
            SessionEvent::MessageAppended { .. } => "message.appended",
            SessionEvent::ParticipantStatusChanged { .. } => "participant.statusChanged",
            SessionEvent::ProgressUpdated { .. } => "progress.updated",
            SessionEvent::SessionStatusChanged { .. } => "session.statusChanged",
            SessionEvent::SessionConcluded { .. } => "session.concluded",
            SessionEvent::PersistenceDegraded { .. } => "persistence.degraded",
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            SessionEvent::SessionStarted { session_id, .. }
            | SessionEvent::MessageAppended { session_id, .. }
            | SessionEvent::ParticipantStatusChanged { session_id, .. }
            | SessionEvent::ProgressUpdated { session_id, .. }
            | SessionEvent::SessionStatusChanged { session_id, .. }
            | SessionEvent::SessionConcluded { session_id, .. }
            | SessionEvent::PersistenceDegraded { session_id, .. } => session_id,
        }
    }

    /// No further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::SessionConcluded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let event = SessionEvent::ParticipantStatusChanged {
            session_id: SessionId::new("s1"),
            participant_id: ParticipantId::new("editor"),
            status: ParticipantStatus::Thinking,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["participant_id"], "editor");
        assert_eq!(json["status"], "thinking");
    }

    #[test]
    fn test_only_conclusion_is_terminal() {
        let degraded = SessionEvent::PersistenceDegraded {
            session_id: SessionId::new("s1"),
            reason: "disk full".into(),
        };
        assert!(!degraded.is_terminal());
        assert_eq!(degraded.session_id().as_str(), "s1");
    }
}
