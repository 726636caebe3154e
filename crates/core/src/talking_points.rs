//! Talking-Point and Flow Generation
//!
//! Turns a free-form description of what the user wants to say into a
//! prioritized list of [`TalkingPoint`]s or a [`PresentationalFlow`] outline.
//! Model output is never trusted: it is parsed leniently and then normalized
//! into the shapes and limits the rest of the engine relies on.

use crate::lexicon::salient;
use crate::llm_client::LLMClient;
use crate::topic::{
    DEFAULT_IMPORTANCE, FlowSection, MAX_POINT_CHARS, PresentationalFlow, TalkingPoint,
    clamp_importance,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

pub const DEFAULT_COUNT_MIN: usize = 8;
pub const DEFAULT_COUNT_MAX: usize = 15;
/// Upper bound on talking points per request, whatever the caller asks for.
pub const MAX_POINTS: usize = 30;
pub const DEFAULT_SECTIONS_MIN: usize = 2;
pub const DEFAULT_SECTIONS_MAX: usize = 4;

const PLACEHOLDER_POINT: &str = "(Add a key point)";
const MAX_TITLE_CHARS: usize = 120;
const MAX_GOALS: usize = 6;
const MAX_GOAL_CHARS: usize = 140;
const DEFAULT_GOALS: [&str; 2] = ["State the objective", "Set audience expectations"];
const BLANK_GOALS: [&str; 2] = ["Add a brief goal", "Add another brief goal"];

pub const POINTS_PROMPT_KEY: &str = "talking_points";
pub const FLOW_PROMPT_KEY: &str = "presentation_flow";

const POINTS_SYSTEM_PROMPT: &str = "You are an expert speech coach.";
const FLOW_SYSTEM_PROMPT: &str = "You are an expert presentation coach.";

const POINTS_PROMPT: &str = "Given the CONTEXT, produce {count_min}-{count_max} analytical questions with importance weights.

Rules:
- Each point: { \"text\": string (<= 140 chars), \"importance\": integer 1-5 }.
- Importance 5 = must-cover; 1 = nice-to-have.
- Avoid duplicates; combine overlapping ideas; keep language audience-appropriate.
- {mode}
- Return ONLY valid JSON with shape: { \"points\": [{ \"text\": string, \"importance\": integer }] }.

CONTEXT:
{context}";

const FLOW_PROMPT: &str = "Given the CONTEXT, produce a clean, concise presentation flow with an intro, {min}-{max} body sections, a conclusion, and a short Q&A plan.

Rules:
- Each unit has: { \"title\": string (<= 80 chars), \"goals\": string[] with 2-4 short bullets (<= 100 chars each) }.
- Sections should be audience-appropriate and non-overlapping; use clear transitions implicitly by section ordering.
- {mode}
- Return ONLY valid JSON with shape: { \"flow\": { \"intro\": {...}, \"sections\": [...], \"conclusion\": {...}, \"qa\": {...} } }.

CONTEXT:
{context}";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^```[a-zA-Z0-9]*\n([\s\S]*?)\n```$").expect("valid regex")
});

// Bullet or numbered line with an optional trailing weight: "- Budget (4)".
static POINT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*\d.)\s]*([^()\-•]+?)(?:\s*[(\[]?(\d)\)?\]?)?\s*$").expect("valid regex")
});

/// Model output that could not be read as the requested structure.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Failed to parse {what} from model output")]
    Unparseable { what: &'static str, raw: String },
}

impl GenerationError {
    fn unparseable(what: &'static str, raw: &str) -> Self {
        Self::Unparseable {
            what,
            raw: raw.chars().take(1000).collect(),
        }
    }
}

fn default_count_min() -> usize {
    DEFAULT_COUNT_MIN
}

fn default_count_max() -> usize {
    DEFAULT_COUNT_MAX
}

fn default_sections_min() -> usize {
    DEFAULT_SECTIONS_MIN
}

fn default_sections_max() -> usize {
    DEFAULT_SECTIONS_MAX
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PointsRequest {
    pub context: String,
    #[serde(default)]
    pub presentational: bool,
    #[serde(default = "default_count_min")]
    pub count_min: usize,
    #[serde(default = "default_count_max")]
    pub count_max: usize,
}

impl PointsRequest {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            presentational: false,
            count_min: DEFAULT_COUNT_MIN,
            count_max: DEFAULT_COUNT_MAX,
        }
    }

    /// Effective point bounds: `min` in `[1, 30]`, `max` in `[min, 30]`.
    pub fn count_range(&self) -> (usize, usize) {
        let min = self.count_min.clamp(1, MAX_POINTS);
        let max = self.count_max.clamp(min, MAX_POINTS);
        (min, max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlowRequest {
    pub context: String,
    #[serde(default = "default_true")]
    pub presentational: bool,
    /// Desired number of body sections, excluding intro, conclusion and Q&A.
    #[serde(default = "default_sections_min")]
    pub sections_min: usize,
    #[serde(default = "default_sections_max")]
    pub sections_max: usize,
}

impl FlowRequest {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            presentational: true,
            sections_min: DEFAULT_SECTIONS_MIN,
            sections_max: DEFAULT_SECTIONS_MAX,
        }
    }

    /// Effective body-section bounds: `min` in `[1, 8]`, `max` in `[min, 10]`.
    pub fn section_range(&self) -> (usize, usize) {
        let min = self.sections_min.clamp(1, 8);
        let max = self.sections_max.clamp(min, 10);
        (min, max)
    }
}

/// Defines the contract for any service that can plan what a user should cover.
#[async_trait]
pub trait TalkingPointService: Send + Sync {
    /// Produces between `count_min` and `count_max` weighted talking points.
    async fn generate_points(&self, request: &PointsRequest) -> Result<Vec<TalkingPoint>>;

    /// Produces a presentation outline with a body-section count inside the
    /// requested range.
    async fn generate_flow(&self, request: &FlowRequest) -> Result<PresentationalFlow>;

    /// Name reported in response metadata.
    fn model(&self) -> String;
}

/// Built-in prompt templates, keyed by [`POINTS_PROMPT_KEY`] and [`FLOW_PROMPT_KEY`].
pub fn default_prompts() -> HashMap<String, String> {
    HashMap::from([
        (POINTS_PROMPT_KEY.to_string(), POINTS_PROMPT.to_string()),
        (FLOW_PROMPT_KEY.to_string(), FLOW_PROMPT.to_string()),
    ])
}

/// An implementation of `TalkingPointService` backed by a chat model.
pub struct LLMTalkingPointService {
    client: Arc<dyn LLMClient>,
    prompts: HashMap<String, String>,
}

impl LLMTalkingPointService {
    /// Creates a new service.
    ///
    /// # Arguments
    ///
    /// * `client` - The chat model to ask.
    /// * `prompts` - Templates keyed by [`POINTS_PROMPT_KEY`] and [`FLOW_PROMPT_KEY`].
    pub fn new(client: Arc<dyn LLMClient>, prompts: HashMap<String, String>) -> Self {
        Self { client, prompts }
    }

    pub fn with_default_prompts(client: Arc<dyn LLMClient>) -> Self {
        Self::new(client, default_prompts())
    }

    fn template(&self, key: &str) -> Result<&str> {
        self.prompts
            .get(key)
            .map(String::as_str)
            .with_context(|| format!("Missing prompt template: '{}'", key))
    }
}

#[async_trait]
impl TalkingPointService for LLMTalkingPointService {
    async fn generate_points(&self, request: &PointsRequest) -> Result<Vec<TalkingPoint>> {
        let (count_min, count_max) = request.count_range();
        let mode = if request.presentational {
            "This is a presentational scenario. Prioritize an arc: objective, key sections, transitions, and conclusion."
        } else {
            "This is an interactive scenario. Prioritize goal-oriented, conversational points and checkpoints."
        };
        let prompt = self
            .template(POINTS_PROMPT_KEY)?
            .replace("{count_min}", &count_min.to_string())
            .replace("{count_max}", &count_max.to_string())
            .replace("{mode}", mode)
            .replace("{context}", &request.context);

        let answer = self
            .client
            .complete(POINTS_SYSTEM_PROMPT, &prompt)
            .await
            .context("Failed to generate talking points")?;

        let raw = parse_points(&answer).ok_or_else(|| {
            warn!("Model output held no talking points");
            GenerationError::unparseable("talking points", &answer)
        })?;
        let points = normalize_points(&raw, count_min, count_max);
        info!(count = points.len(), "Generated talking points");
        Ok(points)
    }

    async fn generate_flow(&self, request: &FlowRequest) -> Result<PresentationalFlow> {
        let (min, max) = request.section_range();
        let mode = if request.presentational {
            "This is a presentational scenario. Emphasize clarity, scaffolding, and logical structure."
        } else {
            "This is an interactive scenario. Keep the structure brief and flexible."
        };
        let prompt = self
            .template(FLOW_PROMPT_KEY)?
            .replace("{min}", &min.to_string())
            .replace("{max}", &max.to_string())
            .replace("{mode}", mode)
            .replace("{context}", &request.context);

        let answer = self
            .client
            .complete(FLOW_SYSTEM_PROMPT, &prompt)
            .await
            .context("Failed to generate presentation flow")?;

        let raw = parse_flow(&answer).ok_or_else(|| {
            warn!("Model output held no presentation flow");
            GenerationError::unparseable("flow", &answer)
        })?;
        let flow = fit_sections(normalize_flow(&raw), min, max);
        info!(sections = flow.sections.len(), "Generated presentation flow");
        Ok(flow)
    }

    fn model(&self) -> String {
        self.client.model()
    }
}

/// A mock `TalkingPointService` with deterministic output built from the
/// context's own keywords.
pub struct MockTalkingPointService;

#[async_trait]
impl TalkingPointService for MockTalkingPointService {
    async fn generate_points(&self, request: &PointsRequest) -> Result<Vec<TalkingPoint>> {
        let (count_min, count_max) = request.count_range();
        let raw: Vec<Value> = salient(&request.context, count_max)
            .into_iter()
            .enumerate()
            .map(|(i, keyword)| json!({ "text": keyword, "importance": 5 - (i % 5) }))
            .collect();
        Ok(normalize_points(&raw, count_min, count_max))
    }

    async fn generate_flow(&self, request: &FlowRequest) -> Result<PresentationalFlow> {
        let (min, max) = request.section_range();
        let sections: Vec<Value> = salient(&request.context, max)
            .into_iter()
            .map(|keyword| json!({ "title": keyword }))
            .collect();
        let raw = json!({ "sections": sections });
        Ok(fit_sections(normalize_flow(&raw), min, max))
    }

    fn model(&self) -> String {
        "mock".to_string()
    }
}

fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace(text, "$1").into_owned()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Reads candidate points out of model output.
///
/// Tries, in order: the whole text as a JSON array or `{"points": [...]}`,
/// the first `[`..last `]` slice as a JSON array, and finally one point per
/// bullet line with an optional `(n)` weight. Returns `None` when nothing
/// usable is found.
pub fn parse_points(text: &str) -> Option<Vec<Value>> {
    let cleaned = strip_code_fences(text.trim());
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        match value {
            Value::Array(items) => return Some(items),
            Value::Object(mut obj) => {
                if let Some(Value::Array(items)) = obj.remove("points") {
                    return Some(items);
                }
            }
            _ => {}
        }
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if end > start {
            if let Ok(Value::Array(items)) = serde_json::from_str(&cleaned[start..=end]) {
                return Some(items);
            }
        }
    }

    let points: Vec<Value> = cleaned
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let caps = POINT_LINE.captures(line)?;
            let text = caps.get(1)?.as_str().trim();
            if text.is_empty() {
                return None;
            }
            let importance = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map_or(DEFAULT_IMPORTANCE, clamp_importance);
            Some(json!({ "text": text, "importance": importance }))
        })
        .collect();

    (!points.is_empty()).then_some(points)
}

fn raw_importance(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match raw {
        Some(n) if n.is_finite() && n != 0.0 => clamp_importance(n),
        _ => DEFAULT_IMPORTANCE,
    }
}

/// Shapes raw candidates into at least `count_min` and at most `count_max`
/// points. `count_max` wins when the bounds cross.
///
/// Entries without a non-blank string `text` are dropped. Text is trimmed and
/// cut to 200 characters; importance is rounded and clamped into `[1, 5]`,
/// with missing or zero weights defaulting to 3. Shortfalls are padded with
/// editable placeholders.
pub fn normalize_points(raw: &[Value], count_min: usize, count_max: usize) -> Vec<TalkingPoint> {
    let mut points: Vec<TalkingPoint> = raw
        .iter()
        .filter_map(|item| {
            let text = item.get("text")?.as_str()?.trim();
            if text.is_empty() {
                return None;
            }
            let importance = raw_importance(item.get("importance"));
            Some(TalkingPoint::new(
                truncate_chars(text, MAX_POINT_CHARS),
                importance as i64,
            ))
        })
        .collect();

    points.truncate(count_max);
    while points.len() < count_min.min(count_max) {
        points.push(TalkingPoint::new(PLACEHOLDER_POINT, DEFAULT_IMPORTANCE as i64));
    }
    points
}

/// Reads a raw flow object out of model output.
///
/// Accepts `{"flow": {...}}` or a bare object, either as the whole text or as
/// the first `{`..last `}` slice.
pub fn parse_flow(text: &str) -> Option<Value> {
    let cleaned = strip_code_fences(text.trim());
    if cleaned.is_empty() {
        return None;
    }

    let unwrap = |value: Value| -> Option<Value> {
        match value {
            Value::Object(mut obj) => match obj.remove("flow") {
                Some(flow) if is_truthy(&flow) => Some(flow),
                Some(flow) => {
                    obj.insert("flow".to_string(), flow);
                    Some(Value::Object(obj))
                }
                None => Some(Value::Object(obj)),
            },
            Value::Array(items) => Some(Value::Array(items)),
            _ => None,
        }
    };

    if let Some(flow) = serde_json::from_str::<Value>(&cleaned).ok().and_then(unwrap) {
        return Some(flow);
    }

    let (start, end) = (cleaned.find('{')?, cleaned.rfind('}')?);
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&cleaned[start..=end])
        .ok()
        .and_then(unwrap)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn blank_section(title: impl Into<String>) -> FlowSection {
    FlowSection::new(title, owned(&BLANK_GOALS))
}

fn normalize_section(raw: Option<&Value>, fallback_title: &str) -> FlowSection {
    let title = raw
        .and_then(|s| s.get("title"))
        .filter(|t| is_truthy(t))
        .map(value_text)
        .map(|t| truncate_chars(t.trim(), MAX_TITLE_CHARS))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title.to_string());

    let goals: Vec<String> = match raw.and_then(|s| s.get("goals")) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|g| value_text(g).trim().to_string())
            .filter(|g| !g.is_empty())
            .take(MAX_GOALS)
            .map(|g| truncate_chars(&g, MAX_GOAL_CHARS))
            .collect(),
        _ => Vec::new(),
    };
    let goals = if goals.is_empty() { owned(&DEFAULT_GOALS) } else { goals };

    FlowSection::new(title, goals)
}

/// Fills ids, fallback titles and goal limits on a raw flow.
///
/// Missing units get their fallback title (Introduction, Section n,
/// Conclusion, Q&A) and default goals; an absent or empty section list
/// becomes two blank sections.
pub fn normalize_flow(raw: &Value) -> PresentationalFlow {
    let sections = match raw.get("sections") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .enumerate()
            .map(|(i, s)| normalize_section(Some(s), &format!("Section {}", i + 1)))
            .collect(),
        _ => vec![blank_section("Section 1"), blank_section("Section 2")],
    };

    PresentationalFlow {
        intro: normalize_section(raw.get("intro"), "Introduction"),
        sections,
        conclusion: normalize_section(raw.get("conclusion"), "Conclusion"),
        qa: normalize_section(raw.get("qa"), "Q&A"),
    }
}

/// Trims or pads the body sections into `[min, max]`.
pub fn fit_sections(mut flow: PresentationalFlow, min: usize, max: usize) -> PresentationalFlow {
    flow.sections.truncate(max);
    while flow.sections.len() < min {
        let title = format!("Section {}", flow.sections.len() + 1);
        flow.sections.push(blank_section(title));
    }
    flow
}
