//! Practice Session State
//!
//! A [`PracticeSession`] bundles everything one run of a scenario needs: the
//! scenario, the drawn cast, the pacing tier, the read-only prompt context
//! and the transcript. It performs no I/O and never sleeps; the caller owns
//! the clock and decides when turns happen.

use crate::agent::{Agent, select_agents};
use crate::composer::{AgentPromptContext, ResponseComposer};
use crate::conversation::{Turn, flatten};
use crate::pacing::{response_delay, score};
use crate::scenario::{Difficulty, Scenario, find_scenario};
use crate::topic::TalkingPoint;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

const WELCOME: &str = "Hello! Welcome to the session. Feel free to introduce yourself!";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Scenario '{0}' not found")]
    UnknownScenario(String),
}

/// User choices made before a session starts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionOptions {
    /// Overrides the scenario's default tier.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub user_extras: Option<String>,
    #[serde(default)]
    pub talking_points: Vec<TalkingPoint>,
    /// Session length in seconds; `Some(0)` disables the timer.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// A line an agent just said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTurn {
    pub agent: Agent,
    pub text: String,
}

/// Summary stored once a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub scenario_id: String,
    pub date: DateTime<Utc>,
    pub score: u32,
    /// Elapsed session time in seconds.
    pub duration: u64,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone)]
pub struct PracticeSession {
    scenario: &'static Scenario,
    agents: Vec<Agent>,
    difficulty: Difficulty,
    context: AgentPromptContext,
    duration: u64,
    turns: Vec<Turn>,
}

impl PracticeSession {
    /// Starts a session for `scenario_id`, drawing its cast from the persona pool.
    pub fn start<R: Rng + ?Sized>(
        rng: &mut R,
        scenario_id: &str,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let scenario = find_scenario(scenario_id)
            .ok_or_else(|| SessionError::UnknownScenario(scenario_id.to_string()))?;
        let agents = select_agents(rng, scenario);
        let difficulty = options.difficulty.unwrap_or(scenario.difficulty);
        let duration = options.duration.unwrap_or(scenario.duration);
        let context =
            AgentPromptContext::for_scenario(scenario, options.user_extras, options.talking_points);

        info!(
            scenario = scenario.id,
            %difficulty,
            duration,
            agents = agents.len(),
            talking_points = context.talking_points.len(),
            "Practice session started"
        );

        Ok(Self {
            scenario,
            agents,
            difficulty,
            context,
            duration,
            turns: Vec::new(),
        })
    }

    pub fn scenario(&self) -> &'static Scenario {
        self.scenario
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn context(&self) -> &AgentPromptContext {
        &self.context
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Session length in seconds; zero means untimed.
    pub fn effective_duration(&self) -> u64 {
        self.duration
    }

    /// True once a timed session has run its course.
    pub fn is_expired(&self, elapsed_seconds: u64) -> bool {
        self.duration > 0 && elapsed_seconds >= self.duration
    }

    /// The first agent's welcome line, recorded in the transcript.
    pub fn greeting(&mut self) -> Option<AgentTurn> {
        let agent = self.agents.first()?.clone();
        let text = agent.voice(WELCOME);
        self.turns
            .push(Turn::agent(agent.id.clone(), agent.name.clone(), text.clone()));
        Some(AgentTurn { agent, text })
    }

    /// Appends a user line. Blank input is ignored and returns `false`.
    pub fn record_user_message(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.turns.push(Turn::user(text));
        true
    }

    pub fn user_message_count(&self) -> u32 {
        self.turns.iter().filter(|t| t.speaker.is_user()).count() as u32
    }

    /// Wait before the next agent line.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        response_delay(rng, self.difficulty)
    }

    /// Lets a random agent speak and records the line.
    pub fn next_turn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        composer: &ResponseComposer,
    ) -> Option<AgentTurn> {
        if self.agents.is_empty() {
            return None;
        }
        let agent = self.agents[rng.random_range(0..self.agents.len())].clone();
        let history = flatten(&self.turns);
        let text = composer.compose(
            rng,
            self.scenario.scenario_type,
            &agent,
            self.difficulty,
            &history,
            Some(&self.context),
        );
        self.turns
            .push(Turn::agent(agent.id.clone(), agent.name.clone(), text.clone()));
        Some(AgentTurn { agent, text })
    }

    /// Scores the session and produces its record.
    pub fn finish(&self, elapsed_seconds: u64) -> SessionRecord {
        let record = SessionRecord {
            scenario_id: self.scenario.id.to_string(),
            date: Utc::now(),
            score: score(self.user_message_count(), elapsed_seconds, self.difficulty),
            duration: elapsed_seconds,
            difficulty: self.difficulty,
        };
        info!(
            scenario = self.scenario.id,
            score = record.score,
            duration = record.duration,
            "Practice session finished"
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Speaker;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_start_unknown_scenario() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = PracticeSession::start(&mut rng, "karaoke", SessionOptions::default()).unwrap_err();
        assert_eq!(err, SessionError::UnknownScenario("karaoke".to_string()));
        assert_eq!(err.to_string(), "Scenario 'karaoke' not found");
    }

    #[test]
    fn test_start_uses_scenario_defaults() {
        let mut rng = StdRng::seed_from_u64(0);
        let session = PracticeSession::start(&mut rng, "presentation", SessionOptions::default())
            .unwrap();
        assert_eq!(session.agents().len(), 5);
        assert_eq!(session.difficulty(), Difficulty::Medium);
        assert_eq!(session.effective_duration(), 420);
        assert!(session.context().presentational);
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_start_applies_options() {
        let mut rng = StdRng::seed_from_u64(0);
        let options = SessionOptions {
            difficulty: Some(Difficulty::Easy),
            user_extras: Some("   ".to_string()),
            talking_points: vec![TalkingPoint::new("salary", 5)],
            duration: Some(0),
        };
        let session = PracticeSession::start(&mut rng, "job-interview", options).unwrap();
        assert_eq!(session.difficulty(), Difficulty::Easy);
        assert_eq!(session.effective_duration(), 0);
        assert!(!session.is_expired(100_000));
        assert_eq!(session.context().user_extras, None);
        assert_eq!(session.context().talking_points.len(), 1);
    }

    #[test]
    fn test_is_expired() {
        let mut rng = StdRng::seed_from_u64(0);
        let session = PracticeSession::start(&mut rng, "classroom", SessionOptions::default())
            .unwrap();
        assert!(!session.is_expired(179));
        assert!(session.is_expired(180));
    }

    #[test]
    fn test_greeting_and_turns_are_recorded() {
        let mut rng = StdRng::seed_from_u64(8);
        let composer = ResponseComposer::default();
        let options = SessionOptions {
            talking_points: vec![TalkingPoint::new("leadership experience", 5)],
            ..SessionOptions::default()
        };
        let mut session = PracticeSession::start(&mut rng, "job-interview", options).unwrap();

        let greeting = session.greeting().unwrap();
        assert!(greeting.text.ends_with(WELCOME));
        assert_eq!(greeting.agent, session.agents()[0]);

        assert!(session.record_user_message("  I have led two teams.  "));
        assert!(!session.record_user_message("   "));

        let turn = session.next_turn(&mut rng, &composer).unwrap();
        assert!(session.agents().contains(&turn.agent));
        assert!(!turn.text.is_empty());

        let turns = session.turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].speaker, Speaker::User);
        assert_eq!(turns[1].text, "I have led two teams.");
        assert_eq!(turns[2].text, turn.text);
        assert_eq!(session.user_message_count(), 1);
    }

    #[test]
    fn test_turns_move_past_covered_points() {
        let mut rng = StdRng::seed_from_u64(21);
        let composer = ResponseComposer::default();
        let options = SessionOptions {
            talking_points: vec![
                TalkingPoint::new("remote work policy", 5),
                TalkingPoint::new("career growth", 3),
            ],
            ..SessionOptions::default()
        };
        let mut session = PracticeSession::start(&mut rng, "job-interview", options).unwrap();

        let first = session.next_turn(&mut rng, &composer).unwrap();
        assert!(first.text.contains("\"remote work policy\""), "{}", first.text);

        session.record_user_message("I prefer remote work twice a week.");
        let second = session.next_turn(&mut rng, &composer).unwrap();
        assert!(second.text.contains("\"career growth\""), "{}", second.text);
    }

    #[test]
    fn test_next_delay_follows_session_difficulty() {
        let mut rng = StdRng::seed_from_u64(0);
        let session = PracticeSession::start(&mut rng, "de-escalation", SessionOptions::default())
            .unwrap();
        let delay = session.next_delay(&mut rng).as_millis();
        assert!((3000..5000).contains(&delay));
    }

    #[test]
    fn test_finish_scores_user_messages() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut session =
            PracticeSession::start(&mut rng, "job-interview", SessionOptions::default()).unwrap();
        session.greeting();
        for _ in 0..10 {
            session.record_user_message("answer");
        }
        let record = session.finish(0);
        assert_eq!(record.scenario_id, "job-interview");
        assert_eq!(record.score, 300);
        assert_eq!(record.duration, 0);
        assert_eq!(record.difficulty, Difficulty::Hard);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["date"].as_str().unwrap().contains('T'));
    }
}
