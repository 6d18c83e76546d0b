//! Topic value object

use serde::{Deserialize, Serialize};

/// The creative-writing topic a session discusses (Value Object)
///
/// Always non-blank. Surrounding whitespace is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic {
    content: String,
}

impl Topic {
    /// Try to create a topic, returning None if blank
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                content: trimmed.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<String> for Topic {
    type Error = &'static str;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Topic::try_new(s).ok_or("topic cannot be empty")
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_trims_whitespace() {
        let topic = Topic::try_new("  A lighthouse keeper's last night  ").unwrap();
        assert_eq!(topic.as_str(), "A lighthouse keeper's last night");
    }

    #[test]
    fn test_blank_topic_rejected() {
        assert!(Topic::try_new("").is_none());
        assert!(Topic::try_new("   \n\t").is_none());
    }

    #[test]
    fn test_topic_deserialize_rejects_blank() {
        let result: Result<Topic, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
        let topic: Topic = serde_json::from_str("\"Dragons\"").unwrap();
        assert_eq!(topic.to_string(), "Dragons");
    }
}
