//! Scenario Catalog
//!
//! The static set of practice scenarios a user can pick from. Every scenario
//! carries the role-setting prompt that grounds the response composer, the
//! number of simulated participants, and the default pacing tier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of social situations the platform simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioType {
    Party,
    Classroom,
    JobInterview,
    DeEscalation,
    Presentation,
}

impl ScenarioType {
    pub const ALL: [ScenarioType; 5] = [
        ScenarioType::Party,
        ScenarioType::Classroom,
        ScenarioType::JobInterview,
        ScenarioType::DeEscalation,
        ScenarioType::Presentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Party => "party",
            ScenarioType::Classroom => "classroom",
            ScenarioType::JobInterview => "job-interview",
            ScenarioType::DeEscalation => "de-escalation",
            ScenarioType::Presentation => "presentation",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pacing tier. Harder tiers answer faster and score higher.
///
/// Deserializes through [`FromStr`], so `"Hard"` and `"hard"` are the same tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Casual,
    Academic,
    Professional,
    Tense,
    Formal,
}

impl Vibe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Casual => "casual",
            Vibe::Academic => "academic",
            Vibe::Professional => "professional",
            Vibe::Tense => "tense",
            Vibe::Formal => "formal",
        }
    }
}

/// A named practice context. Defined once in [`SCENARIOS`] and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub scenario_type: ScenarioType,
    pub participant_count: usize,
    /// Default session length in seconds. Zero disables the timer.
    pub duration: u64,
    pub icon: &'static str,
    pub difficulty: Difficulty,
    pub base_prompt: &'static str,
    pub vibe: Vibe,
    /// Switches the composer to presentation-delivery phrasing.
    pub presentational: bool,
}

pub static SCENARIOS: [Scenario; 5] = [
    Scenario {
        id: "party",
        title: "At a Party",
        description: "Practice mingling and making small talk at a social gathering",
        scenario_type: ScenarioType::Party,
        participant_count: 4,
        duration: 300,
        icon: "🎉",
        difficulty: Difficulty::Easy,
        base_prompt: "You are at a casual social gathering. Your goal is to initiate and sustain friendly, light conversation. Ask open-ended questions, find common interests, and keep the tone positive and inclusive.",
        vibe: Vibe::Casual,
        presentational: false,
    },
    Scenario {
        id: "classroom",
        title: "Called Out in Class",
        description: "Handle being called on unexpectedly during a lecture",
        scenario_type: ScenarioType::Classroom,
        participant_count: 2,
        duration: 180,
        icon: "📚",
        difficulty: Difficulty::Medium,
        base_prompt: "You are a student called upon in class. Explain your thinking clearly, acknowledge uncertainty when needed, and engage constructively with the instructor and peers. Be concise and respectful.",
        vibe: Vibe::Academic,
        presentational: false,
    },
    Scenario {
        id: "job-interview",
        title: "Job Interview",
        description: "Navigate a one-on-one job interview scenario",
        scenario_type: ScenarioType::JobInterview,
        participant_count: 2,
        duration: 600,
        icon: "💼",
        difficulty: Difficulty::Hard,
        base_prompt: "You are the candidate in a professional job interview. Expect behavioral questions and provide structured, concise answers (consider STAR: Situation, Task, Action, Result). Demonstrate motivation, relevant skills, and cultural fit. Ask clarifying questions when appropriate.",
        vibe: Vibe::Professional,
        presentational: false,
    },
    Scenario {
        id: "de-escalation",
        title: "De-escalation",
        description: "Practice calming down a tense situation",
        scenario_type: ScenarioType::DeEscalation,
        participant_count: 3,
        duration: 240,
        icon: "🤝",
        difficulty: Difficulty::Hard,
        base_prompt: "You are de-escalating a tense situation. Stay calm, listen actively, acknowledge emotions, and guide the conversation toward shared goals and a constructive next step. Avoid blame; use neutral language.",
        vibe: Vibe::Tense,
        presentational: false,
    },
    Scenario {
        id: "presentation",
        title: "Class Presentation",
        description: "Deliver a presentation to your classmates",
        scenario_type: ScenarioType::Presentation,
        participant_count: 5,
        duration: 420,
        icon: "🎤",
        difficulty: Difficulty::Medium,
        base_prompt: "You are delivering a clear, engaging class presentation. Structure with an intro, 2-4 key sections with transitions, and a brief conclusion. Keep explanations accessible and invite questions.",
        vibe: Vibe::Academic,
        presentational: true,
    },
];

pub fn scenarios() -> &'static [Scenario] {
    &SCENARIOS
}

/// Looks up a scenario by id. `None` means the session cannot start.
pub fn find_scenario(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}
