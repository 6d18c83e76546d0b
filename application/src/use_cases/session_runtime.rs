//! Shared runtime state of one running session.
//!
//! The session aggregate lives behind a `std::sync::Mutex` that is never
//! held across an `.await`. Every mutation goes through a [`SessionGuard`],
//! which publishes events and writes through to the repository while the
//! lock is still held, so event order equals mutation order.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::events::{SessionEvent, SharedEventBus};
use crate::ports::session_repository::{PersistenceError, SessionRepository};
use roundtable_domain::{
    DiscussionProgress, DiscussionSession, DomainError, Message, ParticipantId, ParticipantStatus,
    SessionId,
};

/// Mutable state guarded by the session lock
pub(crate) struct SessionState {
    pub session: DiscussionSession,
    /// Token of the gateway call or backoff wait currently in progress
    pub in_flight: Option<CancellationToken>,
    /// Set once conclusion started; blocks every further command
    pub concluding: bool,
    pub persistence_degraded: bool,
}

pub(crate) struct SessionRuntime {
    pub id: SessionId,
    state: Mutex<SessionState>,
    /// Wakes the scheduling loop after resume or conclusion
    pub wake: Notify,
    /// Cancelled on orchestrator shutdown; parent of every turn token
    pub shutdown: CancellationToken,
    bus: SharedEventBus,
    repository: Arc<dyn SessionRepository>,
}

impl SessionRuntime {
    pub fn new(
        session: DiscussionSession,
        bus: SharedEventBus,
        repository: Arc<dyn SessionRepository>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id: session.id().clone(),
            state: Mutex::new(SessionState {
                session,
                in_flight: None,
                concluding: false,
                persistence_degraded: false,
            }),
            wake: Notify::new(),
            shutdown,
            bus,
            repository,
        }
    }

    pub fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            state: self.state.lock().unwrap_or_else(|e| e.into_inner()),
            runtime: self,
        }
    }

    /// Read-only copy of the session
    pub fn snapshot(&self) -> DiscussionSession {
        self.lock().session.clone()
    }

    pub fn close_events(&self) {
        self.bus.close(&self.id);
    }
}

/// Locked view of a session with publishing and write-through helpers
pub(crate) struct SessionGuard<'a> {
    state: MutexGuard<'a, SessionState>,
    runtime: &'a SessionRuntime,
}

impl Deref for SessionGuard<'_> {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        &self.state
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }
}

impl SessionGuard<'_> {
    pub fn publish(&self, event: SessionEvent) {
        self.runtime.bus.publish(event);
    }

    pub fn publish_progress(&self) {
        self.publish(SessionEvent::ProgressUpdated {
            session_id: self.runtime.id.clone(),
            progress: DiscussionProgress::calculate(&self.state.session),
        });
    }

    /// Cancel whatever the loop is currently waiting on
    pub fn cancel_in_flight(&mut self) {
        if let Some(token) = self.state.in_flight.take() {
            token.cancel();
        }
    }

    /// Change a participant's status, publishing only real changes
    pub fn set_participant_status(
        &mut self,
        id: &ParticipantId,
        status: ParticipantStatus,
    ) -> Result<(), DomainError> {
        if self.state.session.set_participant_status(id, status)? {
            self.publish_status(id, status);
        }
        Ok(())
    }

    pub fn publish_status(&self, id: &ParticipantId, status: ParticipantStatus) {
        self.publish(SessionEvent::ParticipantStatusChanged {
            session_id: self.runtime.id.clone(),
            participant_id: id.clone(),
            status,
        });
    }

    /// Persist, announce and re-measure after a message joined the log
    pub fn message_appended(&mut self, message: &Message) {
        let result = self.runtime.repository.append_message(message);
        self.record_persistence(result);
        self.publish(SessionEvent::MessageAppended {
            session_id: self.runtime.id.clone(),
            message: message.clone(),
        });
        self.publish_progress();
    }

    /// Write the current snapshot through to the repository
    pub fn persist_session(&mut self) {
        let result = self.runtime.repository.save_session(&self.state.session);
        self.record_persistence(result);
    }

    fn record_persistence(&mut self, result: Result<(), PersistenceError>) {
        let Err(e) = result else {
            return;
        };
        if self.state.persistence_degraded {
            return;
        }
        self.state.persistence_degraded = true;
        warn!(
            session = %self.runtime.id,
            "Persistence failed, continuing in memory: {}",
            e
        );
        self.publish(SessionEvent::PersistenceDegraded {
            session_id: self.runtime.id.clone(),
            reason: e.to_string(),
        });
    }
}
