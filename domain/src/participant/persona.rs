//! Persona configuration for agent participants.
//!
//! A persona is a structured record of trait weights plus optional display
//! name and style note. It is validated once when a session is created and
//! trusted afterwards.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Trait weights shaping how an agent argues, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraitWeights {
    /// Appetite for novel, unexpected ideas
    pub creativity: f32,
    /// Attention to logic, detail and correctness
    pub rigor: f32,
    /// Sensitivity to characters' and colleagues' feelings
    pub empathy: f32,
    /// Willingness to push back and hold a position
    pub assertiveness: f32,
    pub humor: f32,
}

impl Default for TraitWeights {
    fn default() -> Self {
        Self {
            creativity: 0.5,
            rigor: 0.5,
            empathy: 0.5,
            assertiveness: 0.5,
            humor: 0.5,
        }
    }
}

impl TraitWeights {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("creativity", self.creativity),
            ("rigor", self.rigor),
            ("empathy", self.empathy),
            ("assertiveness", self.assertiveness),
            ("humor", self.humor),
        ]
        .into_iter()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in self.iter() {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::invalid_config(format!(
                    "trait weight '{}' must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Traits that clearly stand out (>= 0.7), strongest first
    pub fn dominant(&self) -> Vec<&'static str> {
        let mut traits: Vec<_> = self.iter().filter(|(_, v)| *v >= 0.7).collect();
        traits.sort_by(|a, b| b.1.total_cmp(&a.1));
        traits.into_iter().map(|(name, _)| name).collect()
    }
}

/// Persona of a participant (Value Object)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    pub display_name: Option<String>,
    pub traits: TraitWeights,
    /// Free-text voice/style guidance, e.g. "terse, noir-inflected"
    pub style: Option<String>,
}

impl Personality {
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_traits(mut self, traits: TraitWeights) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.display_name
            && name.trim().is_empty()
        {
            return Err(DomainError::invalid_config("display name cannot be blank"));
        }
        self.traits.validate()
    }
}
