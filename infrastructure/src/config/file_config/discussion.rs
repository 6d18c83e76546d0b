//! Discussion defaults from TOML (`[discussion]` section)

use crate::config::validation::{ConfigIssue, ConfigIssueCode};
use roundtable_domain::{
    DEFAULT_CONTEXT_WINDOW, DEFAULT_MAX_ROUNDS, MAX_PARTICIPANTS, MIN_PARTICIPANTS,
    ParticipantConfig, ParticipantRole, Personality, SessionType, TraitWeights,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw discussion configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiscussionConfig {
    /// Round limit for new sessions
    pub max_rounds: u32,
    /// Session type label (discussion, plot_creation, task, feedback, query)
    pub session_type: String,
    /// Messages of history each turn sees
    pub context_window: usize,
    /// Project id attached to new sessions
    pub project: Option<String>,
    /// Default roster, in turn order
    pub participants: Vec<FileParticipantConfig>,
}

impl Default for FileDiscussionConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            session_type: SessionType::default().to_string(),
            context_window: DEFAULT_CONTEXT_WINDOW,
            project: None,
            participants: vec![
                FileParticipantConfig::new("writer"),
                FileParticipantConfig::new("editor"),
            ],
        }
    }
}

/// One `[[discussion.participants]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileParticipantConfig {
    /// Built-in role name or any custom role
    pub role: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub traits: TraitWeights,
}

impl FileParticipantConfig {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            display_name: None,
            style: None,
            traits: TraitWeights::default(),
        }
    }

    pub fn to_participant_config(&self) -> ParticipantConfig {
        let Ok(role) = self.role.parse::<ParticipantRole>();
        let mut personality = Personality::default().with_traits(self.traits);
        if let Some(name) = &self.display_name {
            personality = personality.with_display_name(name.clone());
        }
        if let Some(style) = &self.style {
            personality = personality.with_style(style.clone());
        }
        ParticipantConfig::new(role).with_personality(personality)
    }
}

impl FileDiscussionConfig {
    /// Parse the session type, falling back to `discussion` on unknown values
    pub fn parse_session_type(&self) -> (SessionType, Vec<ConfigIssue>) {
        match self.session_type.parse::<SessionType>() {
            Ok(session_type) => (session_type, Vec::new()),
            Err(_) => (
                SessionType::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "discussion.session_type".to_string(),
                        value: self.session_type.clone(),
                        valid_values: SessionType::all().iter().map(|t| t.to_string()).collect(),
                    },
                    format!(
                        "discussion.session_type: unknown value '{}', falling back to 'discussion'",
                        self.session_type
                    ),
                )],
            ),
        }
    }

    /// Build the default roster, reporting everything a session start would reject
    pub fn parse_participants(&self) -> (Vec<ParticipantConfig>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let roster: Vec<ParticipantConfig> = self
            .participants
            .iter()
            .map(FileParticipantConfig::to_participant_config)
            .collect();

        if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&roster.len()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidRoster,
                format!(
                    "discussion.participants: {} to {} participants required, found {}",
                    MIN_PARTICIPANTS,
                    MAX_PARTICIPANTS,
                    roster.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        for participant in &roster {
            let id = participant.role.participant_id();
            if !seen.insert(id.clone()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidRoster,
                    format!("discussion.participants: '{}' appears more than once", id),
                ));
            }
            if let Err(e) = participant.personality.validate() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::OutOfRange {
                        field: format!("discussion.participants.{}", id),
                    },
                    format!("discussion.participants.{}: {}", id, e),
                ));
            }
        }
        (roster, issues)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_session_type().1;
        issues.extend(self.parse_participants().1);
        if self.max_rounds == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "discussion.max_rounds".to_string(),
                },
                "discussion.max_rounds must be at least 1",
            ));
        }
        if self.context_window == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "discussion.context_window".to_string(),
                },
                "discussion.context_window is 0: agents will not see earlier messages",
            ));
        }
        issues
    }
}
