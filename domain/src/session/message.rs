//! Discussion messages.
//!
//! Messages are append-only: the session assigns the sequence number at
//! append time and nothing mutates a message afterwards.

use crate::core::ids::{MessageId, ParticipantId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sender id reserved for operator-authored messages
pub const HUMAN_SENDER: &str = "human";
/// Sender id reserved for messages the orchestrator writes itself
pub const SYSTEM_SENDER: &str = "system";

/// Author of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    Agent(ParticipantId),
    Human,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &str {
        match self {
            Sender::Agent(id) => id.as_str(),
            Sender::Human => HUMAN_SENDER,
            Sender::System => SYSTEM_SENDER,
        }
    }

    pub fn is_agent(&self, id: &ParticipantId) -> bool {
        matches!(self, Sender::Agent(agent) if agent == id)
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Sender::Human)
    }

    /// Whether `id` collides with a reserved sender sentinel
    pub fn is_reserved(id: &str) -> bool {
        id == HUMAN_SENDER || id == SYSTEM_SENDER
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Sender {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            HUMAN_SENDER => Sender::Human,
            SYSTEM_SENDER => Sender::System,
            _ => Sender::Agent(ParticipantId::new(s)),
        })
    }
}

/// How strongly a human intervention should steer the next agent turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    #[default]
    Medium,
    High,
}

impl Impact {
    /// Context weight of an intervention with this impact
    pub fn weight(&self) -> f32 {
        match self {
            Impact::Low => 0.5,
            Impact::Medium => 1.0,
            Impact::High => 2.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Impact::Low),
            "medium" | "med" => Ok(Impact::Medium),
            "high" => Ok(Impact::High),
            other => Err(format!(
                "unknown impact '{}', expected low, medium or high",
                other
            )),
        }
    }
}

/// Optional annotations on a message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageMetadata {
    /// Self-reported confidence, clamped to `[0, 1]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotional_tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    /// Set on human interventions only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    /// Round in which the message was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

impl MessageMetadata {
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = if confidence.is_nan() {
            None
        } else {
            Some(confidence.clamp(0.0, 1.0))
        };
        self
    }

    pub fn with_emotional_tone(mut self, tone: impl Into<String>) -> Self {
        self.emotional_tone = Some(tone.into());
        self
    }

    pub fn with_thinking_time_ms(mut self, ms: u64) -> Self {
        self.thinking_time_ms = Some(ms);
        self
    }

    pub fn with_reply_to(mut self, id: MessageId) -> Self {
        self.reply_to = Some(id);
        self
    }

    pub fn with_impact(mut self, impact: Impact) -> Self {
        self.impact = Some(impact);
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }
}

/// A single contribution to a discussion (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    /// Global ordering key; equals the log length at append time
    pub sequence: u64,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

impl Message {
    pub(crate) fn new(
        session_id: &SessionId,
        sequence: u64,
        sender: Sender,
        content: String,
        metadata: MessageMetadata,
    ) -> Self {
        Self {
            id: MessageId::for_sequence(session_id, sequence),
            session_id: session_id.clone(),
            sequence,
            sender,
            content,
            timestamp: Utc::now(),
            metadata,
        }
    }

    pub fn impact(&self) -> Option<Impact> {
        self.metadata.impact
    }
}
