//! Discussion session entities

use super::message::{Message, MessageMetadata, Sender};
use super::status::{SessionCommand, SessionStatus};
use crate::core::error::DomainError;
use crate::core::ids::{MessageId, ParticipantId, SessionId};
use crate::core::topic::Topic;
use crate::participant::entities::{AgentParticipant, ParticipantConfig, ParticipantStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Smallest roster a discussion can run with
pub const MIN_PARTICIPANTS: usize = 2;
/// Largest roster a discussion can run with
pub const MAX_PARTICIPANTS: usize = 5;
/// Round limit used when none is configured
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

/// Kind of session, a fixed vocabulary exposed to the UI layer.
///
/// Scheduling is identical for every type; the type is carried into
/// turn contexts and summaries as a label only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Discussion,
    PlotCreation,
    Task,
    Feedback,
    Query,
}

impl SessionType {
    pub fn as_str(&self) -> &str {
        match self {
            SessionType::Discussion => "discussion",
            SessionType::PlotCreation => "plot_creation",
            SessionType::Task => "task",
            SessionType::Feedback => "feedback",
            SessionType::Query => "query",
        }
    }

    pub fn all() -> [SessionType; 5] {
        [
            SessionType::Discussion,
            SessionType::PlotCreation,
            SessionType::Task,
            SessionType::Feedback,
            SessionType::Query,
        ]
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "discussion" => Ok(SessionType::Discussion),
            "plot_creation" => Ok(SessionType::PlotCreation),
            "task" => Ok(SessionType::Task),
            "feedback" => Ok(SessionType::Feedback),
            "query" => Ok(SessionType::Query),
            other => Err(format!(
                "unknown session type '{}', expected one of: discussion, plot_creation, task, feedback, query",
                other
            )),
        }
    }
}

/// Where the round-robin cursor went after a turn resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    /// Same round, next participant
    NextTurn,
    /// A round finished; carries the new `current_round`
    RoundCompleted(u32),
    /// The final round finished; the session must be concluded
    MaxRoundsReached,
}

/// Lightweight listing entry for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub project_id: Option<String>,
    pub topic: String,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub current_round: u32,
    pub max_rounds: u32,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub concluded_at: Option<DateTime<Utc>>,
}

/// A turn-based discussion between agent participants (Aggregate Root)
///
/// Owns its participants and its message log. All mutation goes through
/// methods that enforce the lifecycle: once concluded, every mutator
/// returns [`DomainError::SessionConcluded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionSession {
    id: SessionId,
    project_id: Option<String>,
    topic: Topic,
    session_type: SessionType,
    status: SessionStatus,
    participants: Vec<AgentParticipant>,
    current_round: u32,
    max_rounds: u32,
    /// Index of the participant whose turn is pending in the current round
    turn_cursor: usize,
    messages: Vec<Message>,
    summary: Option<String>,
    created_at: DateTime<Utc>,
    concluded_at: Option<DateTime<Utc>>,
    /// Highest human-message sequence already fed into an agent turn
    intervention_watermark: Option<u64>,
}

impl DiscussionSession {
    /// Create a session in `pending` status, validating the roster once.
    pub fn new(
        id: SessionId,
        project_id: Option<String>,
        topic: Topic,
        session_type: SessionType,
        participants: Vec<ParticipantConfig>,
        max_rounds: u32,
    ) -> Result<Self, DomainError> {
        if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&participants.len()) {
            return Err(DomainError::invalid_config(format!(
                "a discussion needs {} to {} participants, got {}",
                MIN_PARTICIPANTS,
                MAX_PARTICIPANTS,
                participants.len()
            )));
        }
        if max_rounds == 0 {
            return Err(DomainError::invalid_config("max rounds must be at least 1"));
        }

        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(participants.len());
        for (index, config) in participants.into_iter().enumerate() {
            let participant = AgentParticipant::from_config(config, index)?;
            if Sender::is_reserved(participant.id.as_str()) {
                return Err(DomainError::invalid_config(format!(
                    "'{}' is reserved and cannot be used as a participant id",
                    participant.id
                )));
            }
            if !seen.insert(participant.id.clone()) {
                return Err(DomainError::invalid_config(format!(
                    "duplicate participant '{}'",
                    participant.id
                )));
            }
            roster.push(participant);
        }

        Ok(Self {
            id,
            project_id,
            topic,
            session_type,
            status: SessionStatus::Pending,
            participants: roster,
            current_round: 0,
            max_rounds,
            turn_cursor: 0,
            messages: Vec::new(),
            summary: None,
            created_at: Utc::now(),
            concluded_at: None,
            intervention_watermark: None,
        })
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn participants(&self) -> &[AgentParticipant] {
        &self.participants
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&AgentParticipant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn turn_cursor(&self) -> usize {
        self.turn_cursor
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `n` messages of the log, in order
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn concluded_at(&self) -> Option<DateTime<Utc>> {
        self.concluded_at
    }

    pub fn has_message(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Participant whose turn is pending, or `None` once all rounds ran
    pub fn next_participant(&self) -> Option<&AgentParticipant> {
        if self.status.is_terminal() || self.current_round >= self.max_rounds {
            return None;
        }
        self.participants.get(self.turn_cursor)
    }

    /// Human interventions not yet consumed by an agent turn
    pub fn pending_interventions(&self) -> impl Iterator<Item = &Message> {
        let watermark = self.intervention_watermark;
        self.messages
            .iter()
            .filter(move |m| m.sender.is_human() && watermark.is_none_or(|w| m.sequence > w))
    }

    /// Sequence number the next appended message will receive
    pub fn next_sequence(&self) -> u64 {
        self.messages.len() as u64
    }

    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            project_id: self.project_id.clone(),
            topic: self.topic.to_string(),
            session_type: self.session_type,
            status: self.status,
            current_round: self.current_round,
            max_rounds: self.max_rounds,
            message_count: self.messages.len(),
            created_at: self.created_at,
            concluded_at: self.concluded_at,
        }
    }

    // ==================== Lifecycle ====================

    /// Validate a command against the current status without applying it
    pub fn check(&self, command: SessionCommand) -> Result<SessionStatus, DomainError> {
        self.status.apply(command)
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        self.status = self.status.apply(SessionCommand::Start)?;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        self.status = self.status.apply(SessionCommand::Pause)?;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), DomainError> {
        self.status = self.status.apply(SessionCommand::Resume)?;
        Ok(())
    }

    /// Move to the terminal state with the given summary.
    ///
    /// Every participant is marked finished; the round counter is left as is.
    pub fn conclude(&mut self, summary: String) -> Result<(), DomainError> {
        self.status = self.status.apply(SessionCommand::Conclude)?;
        self.summary = Some(summary);
        self.concluded_at = Some(Utc::now());
        for participant in &mut self.participants {
            participant.status = ParticipantStatus::Finished;
        }
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            Err(DomainError::SessionConcluded)
        } else {
            Ok(())
        }
    }

    // ==================== Participants ====================

    fn participant_mut(&mut self, id: &ParticipantId) -> Result<&mut AgentParticipant, DomainError> {
        self.participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| DomainError::UnknownParticipant(id.to_string()))
    }

    /// Set a participant's status; returns whether it actually changed
    pub fn set_participant_status(
        &mut self,
        id: &ParticipantId,
        status: ParticipantStatus,
    ) -> Result<bool, DomainError> {
        self.ensure_mutable()?;
        let participant = self.participant_mut(id)?;
        let changed = participant.status != status;
        participant.status = status;
        Ok(changed)
    }

    /// Record a failed attempt; returns the consecutive failure count
    pub fn record_turn_failure(&mut self, id: &ParticipantId) -> Result<u32, DomainError> {
        self.ensure_mutable()?;
        Ok(self.participant_mut(id)?.record_failure())
    }

    /// Record a turn aborted by cancellation. Not a failure.
    pub fn record_turn_cancelled(&mut self, id: &ParticipantId) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.participant_mut(id)?.record_cancellation();
        Ok(())
    }

    // ==================== Message log ====================

    fn push_message(
        &mut self,
        sender: Sender,
        content: String,
        mut metadata: MessageMetadata,
    ) -> Result<&Message, DomainError> {
        self.ensure_mutable()?;
        if let Some(reply_to) = &metadata.reply_to
            && !self.has_message(reply_to)
        {
            metadata.reply_to = None;
        }
        let sequence = self.next_sequence();
        let message = Message::new(&self.id, sequence, sender, content, metadata);
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Append the pending participant's contribution.
    ///
    /// Resets the author's failure counter and consumes every human
    /// intervention sequenced up to `interventions_seen` (inclusive).
    pub fn append_agent_message(
        &mut self,
        id: &ParticipantId,
        content: String,
        metadata: MessageMetadata,
        interventions_seen: Option<u64>,
    ) -> Result<&Message, DomainError> {
        self.ensure_mutable()?;
        self.participant_mut(id)?.record_success();
        if let Some(seen) = interventions_seen {
            self.intervention_watermark = Some(self.intervention_watermark.map_or(seen, |w| w.max(seen)));
        }
        let metadata = metadata.with_round(self.current_round);
        self.push_message(Sender::Agent(id.clone()), content, metadata)
    }

    /// Append an operator-authored intervention at the next sequence number
    pub fn append_human_message(
        &mut self,
        content: String,
        metadata: MessageMetadata,
    ) -> Result<&Message, DomainError> {
        self.status.apply(SessionCommand::SubmitHumanMessage)?;
        let metadata = metadata.with_round(self.current_round);
        self.push_message(Sender::Human, content, metadata)
    }

    /// Append a message authored by the orchestrator itself
    pub fn append_system_message(&mut self, content: String) -> Result<&Message, DomainError> {
        let metadata = MessageMetadata::default().with_round(self.current_round);
        self.push_message(Sender::System, content, metadata)
    }

    /// Re-attach a persisted message when rebuilding a session from storage.
    ///
    /// The message must belong to this session and occupy the next free
    /// sequence slot. Participant counters are not replayed.
    pub fn restore_message(&mut self, message: Message) -> Result<(), DomainError> {
        if message.session_id != self.id {
            return Err(DomainError::invalid_config(format!(
                "message {} does not belong to session {}",
                message.id, self.id
            )));
        }
        let expected = self.next_sequence();
        if message.sequence != expected {
            return Err(DomainError::SequenceMismatch {
                expected,
                got: message.sequence,
            });
        }
        self.messages.push(message);
        Ok(())
    }

    // ==================== Round-robin ====================

    /// Resolve the pending turn and move the cursor.
    pub fn advance_turn(&mut self) -> Result<TurnAdvance, DomainError> {
        self.ensure_mutable()?;
        if self.current_round >= self.max_rounds {
            return Ok(TurnAdvance::MaxRoundsReached);
        }
        self.turn_cursor += 1;
        if self.turn_cursor < self.participants.len() {
            return Ok(TurnAdvance::NextTurn);
        }
        self.turn_cursor = 0;
        self.current_round += 1;
        if self.current_round == self.max_rounds {
            Ok(TurnAdvance::MaxRoundsReached)
        } else {
            Ok(TurnAdvance::RoundCompleted(self.current_round))
        }
    }
}
