//! Generation context handed to the completion gateway.
//!
//! - [`TurnContext`] — everything one agent turn sees
//! - [`Transcript`] — the full log, used for summaries

use crate::core::ids::{ParticipantId, SessionId};
use crate::participant::persona::Personality;
use crate::participant::role::ParticipantRole;
use crate::session::entities::{DiscussionSession, SessionType};
use crate::session::message::{Impact, Message};
use serde::{Deserialize, Serialize};

/// Messages included in a turn context when nothing else is configured
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;

/// Snapshot of the participant taking the turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: ParticipantId,
    pub role: ParticipantRole,
    pub display_name: String,
    pub personality: Personality,
}

/// A human intervention with its context weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedIntervention {
    pub message: Message,
    pub impact: Impact,
    pub weight: f32,
}

/// Input for one agent turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    pub session_id: SessionId,
    pub topic: String,
    pub session_type: SessionType,
    pub speaker: Speaker,
    /// Everyone at the table, in turn order
    pub roster: Vec<Speaker>,
    /// 0-based round of this turn
    pub round: u32,
    pub max_rounds: u32,
    /// The last `window` messages of the log, in sequence order
    pub recent_messages: Vec<Message>,
    /// Unconsumed interventions, heaviest first; ties keep receipt order
    pub interventions: Vec<WeightedIntervention>,
}

impl TurnContext {
    /// Build the context for the pending participant, or `None` when no
    /// turn is pending.
    pub fn build(session: &DiscussionSession, window: usize) -> Option<Self> {
        let participant = session.next_participant()?;

        let mut interventions: Vec<WeightedIntervention> = session
            .pending_interventions()
            .map(|m| {
                let impact = m.impact().unwrap_or_default();
                WeightedIntervention {
                    message: m.clone(),
                    impact,
                    weight: impact.weight(),
                }
            })
            .collect();
        interventions.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        Some(Self {
            session_id: session.id().clone(),
            topic: session.topic().to_string(),
            session_type: session.session_type(),
            speaker: speaker(participant),
            roster: session.participants().iter().map(speaker).collect(),
            round: session.current_round(),
            max_rounds: session.max_rounds(),
            recent_messages: session.recent_messages(window).to_vec(),
            interventions,
        })
    }

    /// Highest intervention sequence this context carries
    pub fn interventions_high_water(&self) -> Option<u64> {
        self.interventions.iter().map(|i| i.message.sequence).max()
    }

    pub fn is_final_round(&self) -> bool {
        self.round + 1 >= self.max_rounds
    }

    /// Display name for a message's sender as seen from this table
    pub fn sender_name(&self, message: &Message) -> String {
        self.roster
            .iter()
            .find(|s| message.sender.is_agent(&s.id))
            .map(|s| s.display_name.clone())
            .unwrap_or_else(|| message.sender.to_string())
    }
}

fn speaker(participant: &crate::participant::entities::AgentParticipant) -> Speaker {
    Speaker {
        id: participant.id.clone(),
        role: participant.role.clone(),
        display_name: participant.display_name(),
        personality: participant.personality.clone(),
    }
}

/// Full ordered log of a session, input for summary generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: SessionId,
    pub topic: String,
    pub session_type: SessionType,
    pub participants: Vec<Speaker>,
    pub rounds_completed: u32,
    pub max_rounds: u32,
    pub messages: Vec<Message>,
}

impl Transcript {
    pub fn of(session: &DiscussionSession) -> Self {
        Self {
            session_id: session.id().clone(),
            topic: session.topic().to_string(),
            session_type: session.session_type(),
            participants: session.participants().iter().map(speaker).collect(),
            rounds_completed: session.current_round(),
            max_rounds: session.max_rounds(),
            messages: session.messages().to_vec(),
        }
    }

    pub fn sender_name(&self, message: &Message) -> String {
        self.participants
            .iter()
            .find(|s| message.sender.is_agent(&s.id))
            .map(|s| s.display_name.clone())
            .unwrap_or_else(|| message.sender.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
