//! Defines the WebSocket message protocol between the browser client and the API server.

use crate::models::{AgentView, ScenarioView, SessionRecordView};
use podium_core::{scenario::Difficulty, session::SessionOptions, topic::TalkingPoint};
use serde::{Deserialize, Serialize};

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts a practice session. This must be the first message.
    Init {
        scenario_id: String,
        #[serde(default)]
        difficulty: Option<Difficulty>,
        #[serde(default)]
        user_extras: Option<String>,
        #[serde(default)]
        talking_points: Vec<TalkingPoint>,
        /// Seconds; `0` runs untimed.
        #[serde(default)]
        duration: Option<u64>,
    },
    /// A line typed (or transcribed) from the user.
    UserMessage { text: String },
    /// Stops the session and asks for its record.
    EndSession,
}

impl ClientMessage {
    /// Splits an `init` message into its scenario id and session options.
    pub fn into_init(self) -> Option<(String, SessionOptions)> {
        match self {
            ClientMessage::Init {
                scenario_id,
                difficulty,
                user_extras,
                talking_points,
                duration,
            } => Some((
                scenario_id,
                SessionOptions {
                    difficulty,
                    user_extras,
                    talking_points,
                    duration,
                },
            )),
            _ => None,
        }
    }
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the session started and introduces the cast.
    Initialized {
        scenario: ScenarioView,
        agents: Vec<AgentView>,
        /// Effective length in seconds; `0` means untimed.
        duration: u64,
    },
    /// One line spoken by an agent.
    AgentMessage {
        agent_id: String,
        agent_name: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        voice_id: Option<String>,
    },
    /// Session clock, once per second.
    Tick { elapsed: u64 },
    SessionEnded { record: SessionRecordView },
    /// Reports a fatal error to the client.
    Error { message: String },
}
