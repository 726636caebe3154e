//! Simulated Conversation Partners
//!
//! This module holds the static persona pool and draws the per-session cast.
//! Every drawn persona becomes an [`Agent`] whose id is scoped to the session,
//! so two sessions can both have an `agent-0` without referring to the same
//! persona.

use crate::scenario::Scenario;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A persona template from the static pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub personality: &'static str,
    pub avatar: &'static str,
    pub voice_id: Option<&'static str>,
    /// Bracketed tone tags for the speech synthesizer, e.g. `(calm) (curious)`.
    pub emotion_prefix: Option<&'static str>,
}

pub static PERSONA_POOL: [Persona; 8] = [
    Persona {
        name: "Alex",
        personality: "friendly and outgoing",
        avatar: "👨",
        voice_id: Some("b5f4515fd395410b9ed3aef6fa51d9a0"),
        emotion_prefix: Some("(happy) (excited)"),
    },
    Persona {
        name: "Sarah",
        personality: "professional and direct",
        avatar: "👩",
        voice_id: Some("933563129e564b19a115bedd57b7406a"),
        emotion_prefix: Some("(confident) (calm)"),
    },
    Persona {
        name: "Mike",
        personality: "curious and inquisitive",
        avatar: "👨‍💼",
        voice_id: Some("f3e8c5bbead746e29d47d38a146247ff"),
        emotion_prefix: Some("(curious)"),
    },
    Persona {
        name: "Emma",
        personality: "supportive and encouraging",
        avatar: "👩‍💼",
        voice_id: Some("fbae2ecb433e41a29495707efbc594b5"),
        emotion_prefix: Some("(empathetic) (satisfied)"),
    },
    Persona {
        name: "David",
        personality: "analytical and thoughtful",
        avatar: "👨‍🏫",
        voice_id: Some("c39a76f685cf4f8fb41cd5d3d66b497d"),
        emotion_prefix: Some("(calm) (uncertain)"),
    },
    Persona {
        name: "Lisa",
        personality: "energetic and enthusiastic",
        avatar: "👩‍🎓",
        voice_id: Some("d85e5484b8794626975d69b6ab27ac0c"),
        emotion_prefix: Some("(excited) (delighted)"),
    },
    Persona {
        name: "James",
        personality: "calm and collected",
        avatar: "👨‍🎓",
        voice_id: Some("0b74ead073f2474a904f69033535b98e"),
        emotion_prefix: Some("(relaxed) (calm)"),
    },
    Persona {
        name: "Rachel",
        personality: "challenging and critical",
        avatar: "👩‍🏫",
        voice_id: Some("8cccba59fb744f6d941dad96b3cc6cad"),
        emotion_prefix: Some("(doubtful) (sarcastic)"),
    },
];

/// A persona bound to one practice session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    /// Session-scoped identifier (`agent-{index}`), distinct from the persona name.
    pub id: String,
    pub name: String,
    pub personality: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_prefix: Option<String>,
}

impl Agent {
    /// Binds a persona to a session slot.
    pub fn from_persona(persona: &Persona, index: usize) -> Self {
        Self {
            id: format!("agent-{}", index),
            name: persona.name.to_string(),
            personality: persona.personality.to_string(),
            avatar: persona.avatar.to_string(),
            voice_id: persona.voice_id.map(str::to_string),
            emotion_prefix: persona.emotion_prefix.map(str::to_string),
        }
    }

    /// Prepends the emotion prefix, if any, to spoken text.
    pub fn voice(&self, text: &str) -> String {
        match self.emotion_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, text),
            _ => text.to_string(),
        }
    }
}

/// Draws the session cast from `pool` without replacement.
///
/// The pool is shuffled uniformly and the first `count` personas are kept.
/// Asking for more personas than the pool holds yields the whole pool.
pub fn draw_agents<R: Rng + ?Sized>(rng: &mut R, pool: &[Persona], count: usize) -> Vec<Agent> {
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);
    let agents: Vec<Agent> = shuffled
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, persona)| Agent::from_persona(persona, index))
        .collect();
    debug!(
        requested = count,
        drawn = agents.len(),
        names = ?agents.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
        "Drew session agents"
    );
    agents
}

/// Draws as many agents as the scenario has participants.
pub fn select_agents<R: Rng + ?Sized>(rng: &mut R, scenario: &Scenario) -> Vec<Agent> {
    draw_agents(rng, &PERSONA_POOL, scenario.participant_count)
}
