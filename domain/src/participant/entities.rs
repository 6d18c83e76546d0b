//! Agent participant entities

use super::persona::Personality;
use super::role::ParticipantRole;
use crate::core::error::DomainError;
use crate::core::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// Status of an agent participant within its session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Idle,
    Thinking,
    Responding,
    Error,
    Finished,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ParticipantStatus::Idle => "idle",
            ParticipantStatus::Thinking => "thinking",
            ParticipantStatus::Responding => "responding",
            ParticipantStatus::Error => "error",
            ParticipantStatus::Finished => "finished",
        }
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Start-time configuration of one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    pub role: ParticipantRole,
    #[serde(default)]
    pub personality: Personality,
}

impl ParticipantConfig {
    pub fn new(role: ParticipantRole) -> Self {
        Self {
            role,
            personality: Personality::default(),
        }
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }
}

impl From<ParticipantRole> for ParticipantConfig {
    fn from(role: ParticipantRole) -> Self {
        Self::new(role)
    }
}

/// An agent taking part in a discussion (Entity)
///
/// Owned by its session; the turn index is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentParticipant {
    pub id: ParticipantId,
    pub role: ParticipantRole,
    pub personality: Personality,
    pub status: ParticipantStatus,
    pub turn_index: usize,
    pub message_count: usize,
    /// Failed attempts since this participant's last successful turn
    pub consecutive_failures: u32,
    /// Turns aborted by a pause and re-attempted later
    pub cancelled_turns: u32,
}

impl AgentParticipant {
    pub fn from_config(config: ParticipantConfig, turn_index: usize) -> Result<Self, DomainError> {
        config.personality.validate()?;
        let id = config.role.participant_id();
        if id.is_empty() {
            return Err(DomainError::invalid_config(format!(
                "role '{}' does not yield a usable participant id",
                config.role
            )));
        }
        Ok(Self {
            id: ParticipantId::new(id),
            role: config.role,
            personality: config.personality,
            status: ParticipantStatus::Idle,
            turn_index,
            message_count: 0,
            consecutive_failures: 0,
            cancelled_turns: 0,
        })
    }

    /// Name shown in transcripts: persona display name, else the role name
    pub fn display_name(&self) -> String {
        self.personality
            .display_name
            .clone()
            .unwrap_or_else(|| self.role.display_name())
    }

    pub(crate) fn record_success(&mut self) {
        self.message_count += 1;
        self.consecutive_failures = 0;
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.status = ParticipantStatus::Error;
        self.consecutive_failures
    }

    pub(crate) fn record_cancellation(&mut self) {
        self.cancelled_turns += 1;
        self.status = ParticipantStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::persona::TraitWeights;

    #[test]
    fn test_from_config_derives_id() {
        let participant =
            AgentParticipant::from_config(ParticipantRole::DeputyEditor.into(), 3).unwrap();
        assert_eq!(participant.id.as_str(), "deputy_editor");
        assert_eq!(participant.turn_index, 3);
        assert_eq!(participant.status, ParticipantStatus::Idle);
        assert_eq!(participant.display_name(), "Deputy Editor");
    }

    #[test]
    fn test_from_config_rejects_bad_persona() {
        let config = ParticipantConfig::new(ParticipantRole::Writer).with_personality(
            Personality::default().with_traits(TraitWeights {
                creativity: -0.1,
                ..Default::default()
            }),
        );
        assert!(AgentParticipant::from_config(config, 0).is_err());
    }

    #[test]
    fn test_from_config_rejects_unsluggable_custom_role() {
        let config = ParticipantConfig::new(ParticipantRole::Custom("???".into()));
        let err = AgentParticipant::from_config(config, 0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_failure_and_success_counters() {
        let mut p = AgentParticipant::from_config(ParticipantRole::Editor.into(), 1).unwrap();
        assert_eq!(p.record_failure(), 1);
        assert_eq!(p.record_failure(), 2);
        assert_eq!(p.status, ParticipantStatus::Error);
        p.record_success();
        assert_eq!(p.consecutive_failures, 0);
        assert_eq!(p.message_count, 1);
    }

    #[test]
    fn test_display_name_prefers_persona() {
        let config = ParticipantConfig::new(ParticipantRole::Writer)
            .with_personality(Personality::default().with_display_name("Ines"));
        let p = AgentParticipant::from_config(config, 0).unwrap();
        assert_eq!(p.display_name(), "Ines");
    }
}
