//! Response Composer
//!
//! This module decides what a simulated partner says next. It stands in for a
//! language model with a fixed strategy ladder, first success wins:
//!
//! 1. ask about the most important talking point not yet covered,
//! 2. echo keywords from the user and the scenario back as a follow-up,
//! 3. pick a generic opening or follow-up line for the scenario.
//!
//! The chosen line is then dressed with an optional lead-up filler and the
//! agent's emotion prefix for the speech synthesizer. All randomness comes
//! from the caller's generator, so a seeded generator reproduces a line.

use crate::agent::Agent;
use crate::lexicon::{salient, tokenize};
use crate::phrases::{
    FALLBACK_QUESTION, POINT_QUESTIONS, PRESENTATION_POINT_QUESTIONS, PhraseBook,
};
use crate::scenario::{Difficulty, Scenario, ScenarioType};
use crate::topic::TalkingPoint;
use crate::tracker::{choose_next, last_user_utterance};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const POINT_ECHO_WORDS: usize = 3;
const FOLLOW_UP_ECHO_WORDS: usize = 4;
/// Follow-up templates join the pool once history is longer than this.
const OPENING_TURNS: usize = 2;

/// Read-only per-session context handed to every composer call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPromptContext {
    pub scenario_base_prompt: String,
    #[serde(default)]
    pub user_extras: Option<String>,
    #[serde(default)]
    pub talking_points: Vec<TalkingPoint>,
    #[serde(default)]
    pub presentational: bool,
}

impl AgentPromptContext {
    pub fn for_scenario(
        scenario: &Scenario,
        user_extras: Option<String>,
        talking_points: Vec<TalkingPoint>,
    ) -> Self {
        Self {
            scenario_base_prompt: scenario.base_prompt.to_string(),
            user_extras: user_extras.filter(|e| !e.trim().is_empty()),
            talking_points,
            presentational: scenario.presentational,
        }
    }
}

/// Which rung of the strategy ladder produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    TalkingPoint,
    FollowUp,
    Template,
}

/// Chance that a lead-up filler is put in front of a line.
pub fn lead_up_chance(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 0.4,
        Difficulty::Medium => 0.3,
        Difficulty::Hard => 0.2,
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &'a [String]) -> Option<&'a str> {
    if items.is_empty() {
        None
    } else {
        Some(items[rng.random_range(0..items.len())].as_str())
    }
}

fn echo_clause(words: &[String]) -> String {
    if words.is_empty() {
        String::new()
    } else {
        format!("You mentioned {}. ", words.join(", "))
    }
}

/// Stateless line generator over a fixed [`PhraseBook`].
#[derive(Debug, Clone, Default)]
pub struct ResponseComposer {
    phrases: PhraseBook,
}

impl ResponseComposer {
    pub fn new(phrases: PhraseBook) -> Self {
        Self { phrases }
    }

    pub fn phrases(&self) -> &PhraseBook {
        &self.phrases
    }

    /// Produces the next line for `agent`. Never returns an empty string.
    ///
    /// `history` is the flattened `"Speaker: text"` transcript, oldest first.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scenario_type: ScenarioType,
        agent: &Agent,
        difficulty: Difficulty,
        history: &[String],
        context: Option<&AgentPromptContext>,
    ) -> String {
        let (strategy, line) = self.compose_line(rng, scenario_type, history, context);
        let line = self.with_lead_up(rng, scenario_type, difficulty, line);
        debug!(
            agent = %agent.name,
            scenario = %scenario_type,
            ?strategy,
            "Composed agent line"
        );
        agent.voice(&line)
    }

    /// Runs the strategy ladder without any decoration.
    pub fn compose_line<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scenario_type: ScenarioType,
        history: &[String],
        context: Option<&AgentPromptContext>,
    ) -> (Strategy, String) {
        let last_utterance = last_user_utterance(history);

        if let Some(ctx) = context {
            if let Some(point) = choose_next(&ctx.talking_points, history) {
                let line = self.point_question(
                    rng,
                    &point.text,
                    ctx.presentational,
                    last_utterance.as_deref(),
                );
                return (Strategy::TalkingPoint, line);
            }
        }

        if let Some(line) =
            self.follow_up(rng, scenario_type, last_utterance.as_deref(), context)
        {
            return (Strategy::FollowUp, line);
        }

        (Strategy::Template, self.template(rng, scenario_type, history))
    }

    fn point_question<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        point_text: &str,
        presentational: bool,
        last_utterance: Option<&str>,
    ) -> String {
        let base = point_text
            .trim()
            .trim_end_matches(['?', '!', '.']);
        let echo = echo_clause(&last_utterance.map_or_else(Vec::new, |u| {
            salient(u, POINT_ECHO_WORDS)
        }));
        let shapes = if presentational {
            PRESENTATION_POINT_QUESTIONS
        } else {
            POINT_QUESTIONS
        };
        let shape = shapes[rng.random_range(0..shapes.len())];
        format!("{}{}", echo, shape.replace("{point}", base))
    }

    fn follow_up<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scenario_type: ScenarioType,
        last_utterance: Option<&str>,
        context: Option<&AgentPromptContext>,
    ) -> Option<String> {
        let extras = context
            .map(|c| {
                format!(
                    "{} {}",
                    c.user_extras.as_deref().unwrap_or_default(),
                    c.scenario_base_prompt
                )
            })
            .unwrap_or_default();
        let source = format!("{} {}", last_utterance.unwrap_or_default(), extras.trim());

        let mut words = tokenize(&source);
        if words.is_empty() {
            return None;
        }
        words.truncate(FOLLOW_UP_ECHO_WORDS);

        let question = pick(rng, &self.phrases.get(scenario_type).follow_ups)
            .unwrap_or(FALLBACK_QUESTION);
        Some(format!("{}{}", echo_clause(&words), question))
    }

    fn template<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scenario_type: ScenarioType,
        history: &[String],
    ) -> String {
        let phrases = self.phrases.get(scenario_type);
        let mut pool: Vec<String> = phrases.templates.clone();
        if history.len() > OPENING_TURNS {
            pool.extend(phrases.follow_ups.iter().cloned());
        }
        let candidate = pick(rng, &pool).unwrap_or(FALLBACK_QUESTION).trim_end();
        if candidate.ends_with('?') {
            candidate.to_string()
        } else {
            format!("{}?", candidate)
        }
    }

    fn with_lead_up<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scenario_type: ScenarioType,
        difficulty: Difficulty,
        line: String,
    ) -> String {
        if !rng.random_bool(lead_up_chance(difficulty)) {
            return line;
        }
        match pick(rng, &self.phrases.get(scenario_type).lead_ups) {
            Some(lead_up) => format!("{} {}", lead_up, line),
            None => line,
        }
    }
}
