//! Conversation history as the session controller records it.

use crate::USER_LABEL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who said a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent { id: String, name: String },
}

impl Speaker {
    pub fn label(&self) -> &str {
        match self {
            Speaker::User => USER_LABEL,
            Speaker::Agent { name, .. } => name,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Speaker::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn agent(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent {
                id: id.into(),
                name: name.into(),
            },
            text: text.into(),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label(), self.text)
    }
}

/// Flattens turns into `"Speaker: text"` lines, the shape the tracker and
/// composer read.
pub fn flatten(turns: &[Turn]) -> Vec<String> {
    turns.iter().map(Turn::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_labels_speakers() {
        let turns = vec![
            Turn::agent("agent-0", "Sarah", "Tell me about yourself."),
            Turn::user("I build compilers."),
        ];
        assert_eq!(
            flatten(&turns),
            vec!["Sarah: Tell me about yourself.", "You: I build compilers."]
        );
    }

    #[test]
    fn test_speaker_serialization() {
        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(json["speaker"]["kind"], "user");

        let json = serde_json::to_value(Turn::agent("agent-1", "Mike", "hey")).unwrap();
        assert_eq!(json["speaker"]["kind"], "agent");
        assert_eq!(json["speaker"]["name"], "Mike");
    }
}
