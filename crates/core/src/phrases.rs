//! Phrase Tables
//!
//! Per-scenario wording the composer draws from: lead-up fillers, opening
//! templates and follow-up questions. The built-in book is compiled in; a JSON
//! file can replace any scenario's lists at startup.

use crate::scenario::ScenarioType;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Question shapes for a talking point in open conversation. `{point}` is
/// replaced with the point text.
pub const POINT_QUESTIONS: &[&str] = &[
    "Could you talk a bit about \"{point}\"?",
    "What are your thoughts on \"{point}\"?",
    "How are you thinking about \"{point}\" right now?",
    "Can you clarify your approach to \"{point}\"?",
];

/// Question shapes for a talking point when the user is presenting.
pub const PRESENTATION_POINT_QUESTIONS: &[&str] = &[
    "Where in your presentation will you cover \"{point}\"?",
    "How will you explain \"{point}\" to your audience?",
    "Could you outline how you plan to address \"{point}\"?",
];

/// Used whenever a table the composer needs is empty.
pub const FALLBACK_QUESTION: &str = "Could you elaborate?";

/// The three phrase lists for one scenario type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioPhrases {
    pub lead_ups: Vec<String>,
    pub templates: Vec<String>,
    pub follow_ups: Vec<String>,
}

/// Partial replacement for one scenario, as read from an override file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PhraseOverrides {
    lead_ups: Option<Vec<String>>,
    templates: Option<Vec<String>>,
    follow_ups: Option<Vec<String>>,
}

/// Immutable mapping from scenario type to its phrase lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseBook {
    entries: HashMap<ScenarioType, ScenarioPhrases>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin(scenario_type: ScenarioType) -> ScenarioPhrases {
    match scenario_type {
        ScenarioType::Party => ScenarioPhrases {
            lead_ups: owned(&[
                "So, I was wondering...",
                "Oh, by the way...",
                "I just wanted to ask...",
                "Hey, quick question...",
                "You know what...",
                "Actually...",
                "I'm curious...",
            ]),
            templates: owned(&[
                "Hey! Great to meet you! What brings you here tonight?",
                "I love this music! Have you tried the appetizers yet?",
                "So, what do you do for fun?",
                "This is such a nice venue, right?",
                "Do you know many people here?",
            ]),
            follow_ups: owned(&[
                "That's interesting! How did you get into that?",
                "Oh really? Tell me more!",
                "I've always wanted to try that. Any tips?",
            ]),
        },
        ScenarioType::Classroom => ScenarioPhrases {
            lead_ups: owned(&[
                "I have a question...",
                "Let me think...",
                "Actually, I believe...",
                "From what I understand...",
                "If I may add...",
                "I was thinking...",
                "In my opinion...",
            ]),
            templates: owned(&[
                "Can you elaborate on that point?",
                "What's your reasoning behind that answer?",
                "Interesting perspective. Can you explain further?",
                "I'm not sure I follow. Could you clarify?",
                "That's a good start. What else can you add?",
            ]),
            follow_ups: owned(&[
                "Can you provide an example?",
                "What evidence supports that?",
                "How does that relate to what we discussed earlier?",
            ]),
        },
        ScenarioType::JobInterview => ScenarioPhrases {
            lead_ups: owned(&[
                "That's a great question...",
                "Let me explain...",
                "I'd like to know...",
                "To clarify...",
                "Building on that...",
                "I'm curious about...",
            ]),
            templates: owned(&[
                "Tell me about yourself and your background.",
                "What interests you about this position?",
                "Can you describe a challenging situation you've faced?",
                "Where do you see yourself in five years?",
                "What are your greatest strengths?",
                "Why should we hire you?",
            ]),
            follow_ups: owned(&[
                "Can you give me a specific example?",
                "How did you handle that situation?",
                "What did you learn from that experience?",
            ]),
        },
        ScenarioType::DeEscalation => ScenarioPhrases {
            lead_ups: owned(&[
                "I understand, but...",
                "Let me see if I get this...",
                "I hear what you're saying...",
                "Can we talk about...",
                "I feel like...",
                "Help me understand...",
            ]),
            templates: owned(&[
                "I'm really frustrated with this situation!",
                "This isn't what I expected at all.",
                "Can you help me understand what's going on?",
                "I need this resolved immediately.",
                "I appreciate you taking the time to talk.",
            ]),
            follow_ups: owned(&[
                "I understand, but can we find a solution?",
                "What would make this better for you?",
                "Let's work through this together.",
            ]),
        },
        ScenarioType::Presentation => ScenarioPhrases {
            lead_ups: owned(&[
                "I was wondering...",
                "Can you clarify...",
                "This is interesting, but...",
                "I'd like to know more about...",
                "Going back to your point...",
                "Just to confirm...",
            ]),
            templates: owned(&[
                "Could you explain that slide in more detail?",
                "What data supports that conclusion?",
                "How does this compare to other approaches?",
                "Can you give us a real-world example?",
                "What are the potential limitations?",
            ]),
            follow_ups: owned(&[
                "Could you clarify that point?",
                "What's your source for that information?",
                "How confident are you in these results?",
            ]),
        },
    }
}

impl Default for PhraseBook {
    fn default() -> Self {
        let entries = ScenarioType::ALL
            .into_iter()
            .map(|t| (t, builtin(t)))
            .collect();
        Self { entries }
    }
}

impl PhraseBook {
    /// Phrases for `scenario_type`. Every type has an entry.
    pub fn get(&self, scenario_type: ScenarioType) -> &ScenarioPhrases {
        &self.entries[&scenario_type]
    }

    /// Builds a book from JSON keyed by scenario type, e.g.
    /// `{"party": {"lead_ups": ["Hmm..."]}}`.
    ///
    /// Missing scenarios and missing lists keep the built-in wording. An
    /// explicitly empty list stays empty.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: HashMap<ScenarioType, PhraseOverrides> =
            serde_json::from_str(json).context("Invalid phrase book JSON")?;

        let mut book = Self::default();
        for (scenario_type, o) in overrides {
            let entry = book
                .entries
                .get_mut(&scenario_type)
                .context("Phrase book is missing a built-in scenario")?;
            if let Some(lead_ups) = o.lead_ups {
                entry.lead_ups = lead_ups;
            }
            if let Some(templates) = o.templates {
                entry.templates = templates;
            }
            if let Some(follow_ups) = o.follow_ups {
                entry.follow_ups = follow_ups;
            }
        }
        Ok(book)
    }

    /// Reads [`PhraseBook::from_json`] input from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read phrase book at {}", path.display()))?;
        let book = Self::from_json(&raw)?;
        info!(path = %path.display(), "Loaded phrase book overrides");
        Ok(book)
    }
}
