//! API Models
//!
//! Request and response bodies of the REST surface, annotated for `utoipa`.
//! Core engine types are converted into these views at the boundary.

use chrono::{DateTime, Utc};
use podium_core::{
    agent::Agent,
    extraction::ExtractedDocument,
    scenario::{Difficulty, Scenario},
    session::SessionRecord,
    speech::SpeechRequest,
    talking_points::{
        DEFAULT_COUNT_MAX, DEFAULT_COUNT_MIN, DEFAULT_SECTIONS_MAX, DEFAULT_SECTIONS_MIN,
        FlowRequest, PointsRequest,
    },
    topic::{FlowSection, PresentationalFlow, TalkingPoint},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ScenarioView {
    #[schema(example = "job-interview")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    #[schema(example = "job-interview")]
    pub scenario_type: String,
    pub participant_count: usize,
    /// Default length in seconds; 0 means untimed.
    pub duration: u64,
    pub icon: String,
    #[schema(example = "hard")]
    pub difficulty: String,
    #[schema(example = "professional")]
    pub vibe: String,
    pub presentational: bool,
}

impl From<&Scenario> for ScenarioView {
    fn from(s: &Scenario) -> Self {
        Self {
            id: s.id.to_string(),
            title: s.title.to_string(),
            description: s.description.to_string(),
            scenario_type: s.scenario_type.as_str().to_string(),
            participant_count: s.participant_count,
            duration: s.duration,
            icon: s.icon.to_string(),
            difficulty: s.difficulty.to_string(),
            vibe: s.vibe.as_str().to_string(),
            presentational: s.presentational,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AgentView {
    #[schema(example = "agent-0")]
    pub id: String,
    pub name: String,
    pub personality: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

impl From<&Agent> for AgentView {
    fn from(a: &Agent) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            personality: a.personality.clone(),
            avatar: a.avatar.clone(),
            voice_id: a.voice_id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct TalkingPointView {
    pub id: String,
    pub text: String,
    /// 1 (nice to have) to 5 (must cover).
    #[schema(minimum = 1, maximum = 5)]
    pub importance: u8,
}

impl From<TalkingPoint> for TalkingPointView {
    fn from(p: TalkingPoint) -> Self {
        Self {
            id: p.id,
            text: p.text,
            importance: p.importance,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct FlowSectionView {
    pub id: String,
    pub title: String,
    pub goals: Vec<String>,
}

impl From<FlowSection> for FlowSectionView {
    fn from(s: FlowSection) -> Self {
        Self {
            id: s.id,
            title: s.title,
            goals: s.goals,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct FlowView {
    pub intro: FlowSectionView,
    pub sections: Vec<FlowSectionView>,
    pub conclusion: FlowSectionView,
    pub qa: FlowSectionView,
}

impl From<PresentationalFlow> for FlowView {
    fn from(f: PresentationalFlow) -> Self {
        Self {
            intro: f.intro.into(),
            sections: f.sections.into_iter().map(Into::into).collect(),
            conclusion: f.conclusion.into(),
            qa: f.qa.into(),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct TalkingPointsPayload {
    #[schema(example = "Pitching a community garden to the city council")]
    pub context: String,
    #[serde(default)]
    pub presentational: bool,
    #[schema(example = 8)]
    pub count_min: Option<usize>,
    #[schema(example = 15)]
    pub count_max: Option<usize>,
}

impl From<TalkingPointsPayload> for PointsRequest {
    fn from(p: TalkingPointsPayload) -> Self {
        Self {
            context: p.context,
            presentational: p.presentational,
            count_min: p.count_min.unwrap_or(DEFAULT_COUNT_MIN),
            count_max: p.count_max.unwrap_or(DEFAULT_COUNT_MAX),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct FlowPayload {
    pub context: String,
    /// Defaults to `true`.
    pub presentational: Option<bool>,
    #[schema(example = 2)]
    pub sections_min: Option<usize>,
    #[schema(example = 4)]
    pub sections_max: Option<usize>,
}

impl From<FlowPayload> for FlowRequest {
    fn from(p: FlowPayload) -> Self {
        Self {
            context: p.context,
            presentational: p.presentational.unwrap_or(true),
            sections_min: p.sections_min.unwrap_or(DEFAULT_SECTIONS_MIN),
            sections_max: p.sections_max.unwrap_or(DEFAULT_SECTIONS_MAX),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PointsMeta {
    pub model: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct TalkingPointsResponse {
    pub points: Vec<TalkingPointView>,
    pub meta: PointsMeta,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct FlowMeta {
    pub model: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct FlowResponse {
    pub flow: FlowView,
    pub meta: FlowMeta,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ExtractionMetaView {
    pub pages: usize,
    pub chars: usize,
    #[schema(example = "pdf")]
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ExtractTextResponse {
    pub text: String,
    pub meta: ExtractionMetaView,
}

impl From<ExtractedDocument> for ExtractTextResponse {
    fn from(doc: ExtractedDocument) -> Self {
        Self {
            text: doc.text,
            meta: ExtractionMetaView {
                pages: doc.meta.pages,
                chars: doc.meta.chars,
                file_type: doc.meta.file_type.as_str().to_string(),
                processed_by: doc.meta.processed_by,
            },
        }
    }
}

/// Multipart form for `/extract-text`.
#[derive(ToSchema)]
pub struct ExtractTextForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct TtsPayload {
    /// Spoken verbatim, emotion markers included.
    #[schema(example = "(happy) (excited) Great to meet you!")]
    pub text: String,
    pub agent_name: Option<String>,
    pub voice_id: Option<String>,
}

impl From<TtsPayload> for SpeechRequest {
    fn from(p: TtsPayload) -> Self {
        Self {
            text: p.text,
            agent_name: p.agent_name,
            voice_id: p.voice_id,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SessionRecordView {
    #[schema(example = "party")]
    pub scenario_id: String,
    pub date: DateTime<Utc>,
    pub score: u32,
    /// Elapsed seconds.
    pub duration: u64,
    #[schema(value_type = String, example = "easy")]
    pub difficulty: Difficulty,
}

impl From<SessionRecord> for SessionRecordView {
    fn from(r: SessionRecord) -> Self {
        Self {
            scenario_id: r.scenario_id,
            date: r.date,
            score: r.score,
            duration: r.duration,
            difficulty: r.difficulty,
        }
    }
}

impl From<SessionRecordView> for SessionRecord {
    fn from(r: SessionRecordView) -> Self {
        Self {
            scenario_id: r.scenario_id,
            date: r.date,
            score: r.score,
            duration: r.duration,
            difficulty: r.difficulty,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct RecordsQuery {
    /// Only return records for this scenario.
    pub scenario_id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}
