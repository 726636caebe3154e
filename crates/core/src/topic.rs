use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 5;
pub const DEFAULT_IMPORTANCE: u8 = 3;
/// Longest talking-point text kept after normalization, in characters.
pub const MAX_POINT_CHARS: usize = 200;

/// A prioritized discussion topic the session should surface.
///
/// Importance runs from 1 (nice to have) to 5 (must cover). Values from
/// outside that range are clamped on the way in, including on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkingPoint {
    #[serde(default = "new_id")]
    pub id: String,
    pub text: String,
    #[serde(default = "default_importance", deserialize_with = "deserialize_importance")]
    pub importance: u8,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

fn deserialize_importance<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_importance(raw))
}

/// Rounds and clamps a raw importance weight into `[1, 5]`.
///
/// Non-finite input falls back to the default weight.
pub fn clamp_importance(raw: f64) -> u8 {
    if !raw.is_finite() {
        return DEFAULT_IMPORTANCE;
    }
    raw.round()
        .clamp(MIN_IMPORTANCE as f64, MAX_IMPORTANCE as f64) as u8
}

impl TalkingPoint {
    /// Creates a point with a fresh id, clamping `importance` into range.
    pub fn new(text: impl Into<String>, importance: i64) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            importance: clamp_importance(importance as f64),
        }
    }

    /// True when the text has something worth asking about.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// One unit of a structured presentation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSection {
    pub id: String,
    pub title: String,
    pub goals: Vec<String>,
}

impl FlowSection {
    pub fn new(title: impl Into<String>, goals: Vec<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            goals,
        }
    }
}

/// A four-part presentation outline: intro, body sections, conclusion and Q&A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationalFlow {
    pub intro: FlowSection,
    pub sections: Vec<FlowSection>,
    pub conclusion: FlowSection,
    pub qa: FlowSection,
}
