//! Discussion Orchestrator use case
//!
//! Facade over every running session: lifecycle commands, human
//! interventions, queries and event subscription. Each started session gets
//! its own scheduling loop ([`TurnScheduler`]); commands only touch the
//! session under its lock and wake the loop when scheduling should resume.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::conclusion;
use super::session_runtime::SessionRuntime;
use super::turn_scheduler::TurnScheduler;
use crate::config::{OrchestratorConfig, PausePolicy};
use crate::events::{EventBus, SessionEvent, SharedEventBus};
use crate::ports::completion_gateway::CompletionGateway;
use crate::ports::session_repository::{NoPersistence, PersistenceError, SessionRepository};
use chrono::Utc;
use roundtable_domain::{
    DiscussionProgress, DiscussionSession, DomainError, Impact, Message, MessageMetadata,
    ParticipantConfig, SessionCommand, SessionId, SessionStatus, SessionSummary, SessionType, Topic,
};

/// Errors returned to command callers
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] PersistenceError),
}

impl From<DomainError> for OrchestratorError {
    fn from(e: DomainError) -> Self {
        if e.is_configuration() {
            OrchestratorError::InvalidConfiguration(e.to_string())
        } else {
            OrchestratorError::InvalidState(e.to_string())
        }
    }
}

/// Input for starting a session
#[derive(Debug, Clone)]
pub struct StartSessionInput {
    pub project_id: Option<String>,
    pub topic: String,
    /// Roster in turn order
    pub participants: Vec<ParticipantConfig>,
    pub session_type: SessionType,
    /// Falls back to the orchestrator's default round limit
    pub max_rounds: Option<u32>,
}

impl StartSessionInput {
    pub fn new(topic: impl Into<String>, participants: Vec<ParticipantConfig>) -> Self {
        Self {
            project_id: None,
            topic: topic.into(),
            participants,
            session_type: SessionType::default(),
            max_rounds: None,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_session_type(mut self, session_type: SessionType) -> Self {
        self.session_type = session_type;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}

/// A started session: its id and a receiver subscribed before the first event
pub struct SessionHandle {
    pub session_id: SessionId,
    pub events: broadcast::Receiver<SessionEvent>,
}

/// Orchestrates turn-based discussions between agent participants
pub struct DiscussionOrchestrator<G: CompletionGateway + 'static> {
    gateway: Arc<G>,
    repository: Arc<dyn SessionRepository>,
    bus: SharedEventBus,
    config: OrchestratorConfig,
    /// Every session started here, concluded ones included; without a
    /// repository this is the only copy
    sessions: RwLock<HashMap<SessionId, Arc<SessionRuntime>>>,
    /// Scheduling loops; finished ones are pruned on each start
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl<G: CompletionGateway + 'static> DiscussionOrchestrator<G> {
    /// Orchestrator with default configuration and no persistence
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_config(gateway, Arc::new(NoPersistence), OrchestratorConfig::default())
    }

    pub fn with_config(
        gateway: Arc<G>,
        repository: Arc<dyn SessionRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            repository,
            bus: EventBus::with_capacity(config.event_capacity).shared(),
            config,
            sessions: RwLock::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ==================== Commands ====================

    /// Validate the request, activate the session and spawn its loop.
    ///
    /// Returns as soon as the session is active; the first turn runs in the
    /// background.
    pub async fn start_session(&self, input: StartSessionInput) -> Result<SessionHandle, OrchestratorError> {
        if self.shutdown.is_cancelled() {
            return Err(OrchestratorError::InvalidState(
                "orchestrator is shutting down".to_string(),
            ));
        }
        let topic = Topic::try_new(input.topic).ok_or_else(|| {
            OrchestratorError::InvalidConfiguration("topic must not be blank".to_string())
        })?;
        for participant in &input.participants {
            participant.personality.validate()?;
        }
        let max_rounds = input.max_rounds.unwrap_or(self.config.default_max_rounds);

        let mut session = DiscussionSession::new(
            SessionId::generate(),
            input.project_id,
            topic,
            input.session_type,
            input.participants,
            max_rounds,
        )?;
        session.start()?;
        let session_id = session.id().clone();

        let runtime = Arc::new(SessionRuntime::new(
            session,
            self.bus.clone(),
            self.repository.clone(),
            self.shutdown.child_token(),
        ));
        self.bus.open(&session_id);
        let events = self.bus.subscribe(&session_id);

        {
            let mut guard = runtime.lock();
            guard.persist_session();
            guard.publish(SessionEvent::SessionStarted {
                session_id: session_id.clone(),
                topic: guard.session.topic().to_string(),
                session_type: guard.session.session_type(),
                participants: guard.session.participants().iter().map(|p| p.id.clone()).collect(),
                max_rounds: guard.session.max_rounds(),
                timestamp: Utc::now(),
            });
            guard.publish_progress();
            info!(
                session = %session_id,
                participants = guard.session.participants().len(),
                max_rounds = guard.session.max_rounds(),
                session_type = %guard.session.session_type(),
                "Session started"
            );
        }

        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_id.clone(), runtime.clone());

        let scheduler = TurnScheduler::new(runtime, self.gateway.clone(), self.config.clone());
        let handle = tokio::spawn(scheduler.run());
        {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.retain(|h| !h.is_finished());
            tasks.push(handle);
        }

        Ok(SessionHandle { session_id, events })
    }

    /// Stop scheduling. Under [`PausePolicy::CancelInFlight`] the running
    /// turn is cancelled and re-attempted on resume.
    pub fn pause_session(&self, id: &SessionId) -> Result<(), OrchestratorError> {
        let runtime = self.runtime(id)?;
        let mut guard = runtime.lock();
        guard.session.check(SessionCommand::Pause)?;
        ensure_not_concluding(guard.concluding)?;
        guard.session.pause()?;
        if self.config.pause_policy == PausePolicy::CancelInFlight {
            guard.cancel_in_flight();
        }
        guard.persist_session();
        guard.publish(SessionEvent::SessionStatusChanged {
            session_id: id.clone(),
            status: SessionStatus::Paused,
            reason: None,
        });
        info!(session = %id, policy = self.config.pause_policy.as_str(), "Session paused");
        Ok(())
    }

    /// Continue with the participant whose turn is pending
    pub fn resume_session(&self, id: &SessionId) -> Result<(), OrchestratorError> {
        let runtime = self.runtime(id)?;
        {
            let mut guard = runtime.lock();
            guard.session.check(SessionCommand::Resume)?;
            ensure_not_concluding(guard.concluding)?;
            guard.session.resume()?;
            guard.persist_session();
            guard.publish(SessionEvent::SessionStatusChanged {
                session_id: id.clone(),
                status: SessionStatus::Active,
                reason: None,
            });
        }
        runtime.wake.notify_one();
        info!(session = %id, "Session resumed");
        Ok(())
    }

    /// Cancel any in-flight turn, summarize the transcript so far and move
    /// the session to `concluded`.
    pub async fn conclude_session(&self, id: &SessionId) -> Result<DiscussionSession, OrchestratorError> {
        let runtime = self.runtime(id)?;
        let transcript = {
            let mut guard = runtime.lock();
            conclusion::begin(&mut guard)?
        };
        runtime.wake.notify_one();
        info!(session = %id, messages = transcript.messages.len(), "Concluding session");
        Ok(conclusion::finish(&runtime, self.gateway.as_ref(), transcript, self.config.summary_timeout).await)
    }

    /// Append an operator intervention at the next sequence number.
    ///
    /// Does not trigger a turn; the next agent turn sees it weighted by
    /// `impact`.
    pub fn submit_human_message(
        &self,
        id: &SessionId,
        content: &str,
        impact: Impact,
    ) -> Result<Message, OrchestratorError> {
        if content.trim().is_empty() {
            return Err(OrchestratorError::InvalidConfiguration(
                "message content must not be blank".to_string(),
            ));
        }
        let runtime = self.runtime(id)?;
        let mut guard = runtime.lock();
        guard.session.check(SessionCommand::SubmitHumanMessage)?;
        ensure_not_concluding(guard.concluding)?;
        let message = guard
            .session
            .append_human_message(content.to_string(), MessageMetadata::default().with_impact(impact))?
            .clone();
        guard.message_appended(&message);
        debug!(session = %id, sequence = message.sequence, impact = %impact, "Human message appended");
        Ok(message)
    }

    // ==================== Queries ====================

    /// Snapshot of a session, loaded from the repository when not running here
    pub fn get_session(&self, id: &SessionId) -> Result<DiscussionSession, OrchestratorError> {
        if let Some(runtime) = self.lookup(id) {
            return Ok(runtime.snapshot());
        }
        self.repository
            .load_session(id)?
            .ok_or_else(|| OrchestratorError::SessionNotFound(id.clone()))
    }

    /// Sessions known here or in the repository, oldest first
    pub fn list_sessions(&self, project_id: Option<&str>) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            sessions
                .values()
                .map(|runtime| runtime.lock().session.to_summary())
                .filter(|s| project_id.is_none() || s.project_id.as_deref() == project_id)
                .collect()
        };

        match self.repository.list_sessions(project_id) {
            Ok(stored) => {
                for summary in stored {
                    if !summaries.iter().any(|s| s.id == summary.id) {
                        summaries.push(summary);
                    }
                }
            }
            Err(e) => warn!("Could not list stored sessions: {}", e),
        }

        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }

    pub fn progress(&self, id: &SessionId) -> Result<DiscussionProgress, OrchestratorError> {
        let session = self.get_session(id)?;
        Ok(DiscussionProgress::calculate(&session))
    }

    /// Fresh receiver for a running session's events.
    ///
    /// The receiver of a concluded session is already closed.
    pub fn subscribe(&self, id: &SessionId) -> Result<broadcast::Receiver<SessionEvent>, OrchestratorError> {
        self.runtime(id)?;
        Ok(self.bus.subscribe(id))
    }

    /// Cancel every scheduling loop and wait for them to stop.
    ///
    /// Sessions are left in their current state; nothing is concluded.
    /// Every event channel is closed, so subscribers see the end of stream.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles: Vec<_> = self.tasks.lock().unwrap_or_else(|e| e.into_inner()).drain(..).collect();
        let count = handles.len();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("Scheduling loop ended abnormally: {}", e);
            }
        }
        let runtimes: Vec<_> = self
            .sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for runtime in runtimes {
            runtime.close_events();
        }
        info!(loops = count, "Orchestrator shut down");
    }

    fn lookup(&self, id: &SessionId) -> Option<Arc<SessionRuntime>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }

    fn runtime(&self, id: &SessionId) -> Result<Arc<SessionRuntime>, OrchestratorError> {
        self.lookup(id)
            .ok_or_else(|| OrchestratorError::SessionNotFound(id.clone()))
    }
}

fn ensure_not_concluding(concluding: bool) -> Result<(), OrchestratorError> {
    if concluding {
        Err(OrchestratorError::InvalidState(
            "session is concluding".to_string(),
        ))
    } else {
        Ok(())
    }
}
