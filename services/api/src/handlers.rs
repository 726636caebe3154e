//! Axum Handlers for the REST API
//!
//! Scenario catalog, talking-point and flow generation, document extraction,
//! speech synthesis and session records. It uses `utoipa` doc comments to
//! generate OpenAPI documentation.

use axum::{
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use podium_core::{
    extraction::{ExtractionError, UploadedFile},
    scenario::{find_scenario, scenarios},
    session::SessionError,
    speech::UpstreamStatus,
    talking_points::GenerationError,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    models::{
        ErrorResponse, ExtractTextForm, ExtractTextResponse, FlowMeta, FlowPayload, FlowResponse,
        PointsMeta, RecordsQuery, ScenarioView, SessionRecordView, TalkingPointsPayload,
        TalkingPointsResponse, TtsPayload,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    PayloadTooLarge(String),
    TooManyRequests(String),
    /// An upstream model or speech service failed or answered nonsense.
    BadGateway(String),
    ServiceUnavailable(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::PayloadTooLarge(message) => (StatusCode::PAYLOAD_TOO_LARGE, message),
            ApiError::TooManyRequests(message) => (StatusCode::TOO_MANY_REQUESTS, message),
            ApiError::BadGateway(message) => {
                warn!("Bad gateway: {}", message);
                (StatusCode::BAD_GATEWAY, message)
            }
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

impl ApiError {
    /// Maps a collaborator failure: unreadable model output and upstream
    /// rejections become 502, anything else stays internal.
    fn from_collaborator(err: anyhow::Error) -> Self {
        if let Some(parse) = err.downcast_ref::<GenerationError>() {
            return Self::BadGateway(parse.to_string());
        }
        if let Some(upstream) = err.downcast_ref::<UpstreamStatus>() {
            return Self::BadGateway(upstream.to_string());
        }
        Self::InternalServerError(err)
    }

    /// Maps a failed extraction; only recognized upstream refusals keep
    /// their own status.
    fn from_extraction(err: anyhow::Error) -> Self {
        warn!(error = ?err, "Document extraction failed");
        match err.downcast_ref::<ExtractionError>() {
            Some(ExtractionError::InvalidApiKey) => {
                Self::Unauthorized(ExtractionError::InvalidApiKey.to_string())
            }
            Some(ExtractionError::QuotaExceeded) => {
                Self::TooManyRequests(ExtractionError::QuotaExceeded.to_string())
            }
            Some(ExtractionError::FileTooLarge) => {
                Self::PayloadTooLarge(ExtractionError::FileTooLarge.to_string())
            }
            None => Self::BadGateway(format!("Failed to process document: {}", err)),
        }
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(ExtractionError::FileTooLarge.to_string())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn require_context(context: &str) -> Result<(), ApiError> {
    if context.trim().is_empty() {
        return Err(ApiError::BadRequest("'context' is required".to_string()));
    }
    Ok(())
}

/// List every practice scenario.
#[utoipa::path(
    get,
    path = "/scenarios",
    responses(
        (status = 200, description = "The scenario catalog", body = [ScenarioView])
    )
)]
pub async fn list_scenarios() -> Json<Vec<ScenarioView>> {
    Json(scenarios().iter().map(ScenarioView::from).collect())
}

/// Get one scenario by id.
#[utoipa::path(
    get,
    path = "/scenarios/{id}",
    responses(
        (status = 200, description = "Scenario details", body = ScenarioView),
        (status = 404, description = "Scenario not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Scenario id, e.g. `job-interview`")
    )
)]
pub async fn get_scenario(Path(id): Path<String>) -> Result<Json<ScenarioView>, ApiError> {
    let scenario = find_scenario(&id)
        .ok_or_else(|| ApiError::NotFound(SessionError::UnknownScenario(id).to_string()))?;
    Ok(Json(ScenarioView::from(scenario)))
}

/// Generate weighted talking points from a free-form context.
#[utoipa::path(
    post,
    path = "/analyze/talking-points",
    request_body = TalkingPointsPayload,
    responses(
        (status = 200, description = "Generated talking points", body = TalkingPointsResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "Model output could not be parsed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn generate_talking_points(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TalkingPointsPayload>, JsonRejection>,
) -> Result<Json<TalkingPointsResponse>, ApiError> {
    let payload = json_body(payload)?;
    require_context(&payload.context)?;

    let points = state
        .talking_points
        .generate_points(&payload.into())
        .await
        .map_err(ApiError::from_collaborator)?;

    Ok(Json(TalkingPointsResponse {
        meta: PointsMeta {
            model: state.talking_points.model(),
            count: points.len(),
        },
        points: points.into_iter().map(Into::into).collect(),
    }))
}

/// Generate a presentation outline from a free-form context.
#[utoipa::path(
    post,
    path = "/analyze/flow",
    request_body = FlowPayload,
    responses(
        (status = 200, description = "Generated presentation flow", body = FlowResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "Model output could not be parsed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn generate_flow(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FlowPayload>, JsonRejection>,
) -> Result<Json<FlowResponse>, ApiError> {
    let payload = json_body(payload)?;
    require_context(&payload.context)?;

    let flow = state
        .talking_points
        .generate_flow(&payload.into())
        .await
        .map_err(ApiError::from_collaborator)?;

    Ok(Json(FlowResponse {
        flow: flow.into(),
        meta: FlowMeta {
            model: state.talking_points.model(),
        },
    }))
}

/// Extract the text of an uploaded document, slide deck or image.
#[utoipa::path(
    post,
    path = "/extract-text",
    request_body(content = ExtractTextForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted text", body = ExtractTextResponse),
        (status = 400, description = "Missing file field", body = ErrorResponse),
        (status = 401, description = "Extraction model rejected the API key", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 429, description = "Extraction model quota exceeded", body = ErrorResponse),
        (status = 502, description = "Extraction service failed", body = ErrorResponse)
    )
)]
pub async fn extract_text(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.file").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some(UploadedFile {
            filename,
            content_type,
            data: data.to_vec(),
        });
        break;
    }
    let upload =
        upload.ok_or_else(|| ApiError::BadRequest("A 'file' field is required".to_string()))?;

    let document = state
        .extractor
        .extract(&upload)
        .await
        .map_err(ApiError::from_extraction)?;
    Ok(Json(document.into()))
}

/// Synthesize speech for one agent line.
#[utoipa::path(
    post,
    path = "/tts",
    request_body = TtsPayload,
    responses(
        (status = 200, description = "Synthesized audio", content_type = "audio/mpeg"),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "TTS service failed", body = ErrorResponse),
        (status = 503, description = "TTS is disabled", body = ErrorResponse)
    )
)]
pub async fn synthesize_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    let speech = state
        .speech
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("TTS is disabled".to_string()))?;
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text is required".to_string()));
    }

    let clip = speech
        .synthesize(&payload.into())
        .await
        .map_err(ApiError::from_collaborator)?;
    Ok(([(header::CONTENT_TYPE, clip.content_type)], clip.data).into_response())
}

/// List stored session records.
#[utoipa::path(
    get,
    path = "/records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Completed sessions, oldest first", body = [SessionRecordView])
    )
)]
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecordsQuery>,
) -> Json<Vec<SessionRecordView>> {
    let records = state.records.list(query.scenario_id.as_deref()).await;
    Json(records.into_iter().map(Into::into).collect())
}

/// Store a completed session.
#[utoipa::path(
    post,
    path = "/records",
    request_body = SessionRecordView,
    responses(
        (status = 201, description = "Record stored", body = SessionRecordView),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SessionRecordView>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let record = json_body(payload)?;
    if find_scenario(&record.scenario_id).is_none() {
        return Err(ApiError::BadRequest(
            SessionError::UnknownScenario(record.scenario_id).to_string(),
        ));
    }
    state.records.add(record.clone().into()).await;
    Ok((StatusCode::CREATED, Json(record)))
}
