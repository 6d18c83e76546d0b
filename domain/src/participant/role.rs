//! Participant roles

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Editorial role an agent plays in a discussion (Value Object)
///
/// The four built-in roles cover the newsroom-style roster; anything else
/// is a [`ParticipantRole::Custom`] role keyed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParticipantRole {
    Writer,
    Editor,
    Proofreader,
    DeputyEditor,
    Custom(String),
}

impl ParticipantRole {
    pub fn as_str(&self) -> &str {
        match self {
            ParticipantRole::Writer => "writer",
            ParticipantRole::Editor => "editor",
            ParticipantRole::Proofreader => "proofreader",
            ParticipantRole::DeputyEditor => "deputy_editor",
            ParticipantRole::Custom(name) => name,
        }
    }

    /// Human-readable name used when no display name is configured
    pub fn display_name(&self) -> String {
        match self {
            ParticipantRole::Writer => "Writer".to_string(),
            ParticipantRole::Editor => "Editor".to_string(),
            ParticipantRole::Proofreader => "Proofreader".to_string(),
            ParticipantRole::DeputyEditor => "Deputy Editor".to_string(),
            ParticipantRole::Custom(name) => name.clone(),
        }
    }

    /// Stable participant id derived from the role.
    ///
    /// Custom roles are slugged: lowercase ASCII alphanumerics with `_`
    /// replacing every other run of characters.
    pub fn participant_id(&self) -> String {
        match self {
            ParticipantRole::Custom(name) => slug(name),
            other => other.as_str().to_string(),
        }
    }

    /// One-line description of what the role contributes
    pub fn duty(&self) -> &str {
        match self {
            ParticipantRole::Writer => {
                "Drafts and proposes new material: scenes, characters, plot turns."
            }
            ParticipantRole::Editor => {
                "Shapes structure and pacing, challenges weak ideas, keeps the story coherent."
            }
            ParticipantRole::Proofreader => {
                "Checks consistency, continuity and language; flags errors and ambiguities."
            }
            ParticipantRole::DeputyEditor => {
                "Weighs the discussion against the brief and pushes toward decisions."
            }
            ParticipantRole::Custom(_) => "Contributes from their own specialist perspective.",
        }
    }

    pub fn builtin() -> [ParticipantRole; 4] {
        [
            ParticipantRole::Writer,
            ParticipantRole::Editor,
            ParticipantRole::Proofreader,
            ParticipantRole::DeputyEditor,
        ]
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParticipantRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "writer" => ParticipantRole::Writer,
            "editor" => ParticipantRole::Editor,
            "proofreader" => ParticipantRole::Proofreader,
            "deputy_editor" | "deputy-editor" | "deputyeditor" => ParticipantRole::DeputyEditor,
            _ => ParticipantRole::Custom(s.trim().to_string()),
        })
    }
}

impl Serialize for ParticipantRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParticipantRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(role) = s.parse::<ParticipantRole>();
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roundtrip() {
        for role in ParticipantRole::builtin() {
            let parsed: ParticipantRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_deputy_editor_aliases() {
        let parsed: ParticipantRole = "Deputy-Editor".parse().unwrap();
        assert_eq!(parsed, ParticipantRole::DeputyEditor);
    }

    #[test]
    fn test_custom_role_id_is_slugged() {
        let role: ParticipantRole = "World Builder!".parse().unwrap();
        assert_eq!(role, ParticipantRole::Custom("World Builder!".into()));
        assert_eq!(role.participant_id(), "world_builder");
        assert_eq!(role.display_name(), "World Builder!");
    }

    #[test]
    fn test_builtin_ids() {
        assert_eq!(ParticipantRole::DeputyEditor.participant_id(), "deputy_editor");
        assert_eq!(ParticipantRole::Writer.participant_id(), "writer");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&ParticipantRole::Proofreader).unwrap();
        assert_eq!(json, "\"proofreader\"");
        let role: ParticipantRole = serde_json::from_str("\"historian\"").unwrap();
        assert_eq!(role, ParticipantRole::Custom("historian".into()));
    }
}
