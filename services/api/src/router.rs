//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, WebSocket endpoint, and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AgentView, ErrorResponse, ExtractTextForm, ExtractTextResponse, ExtractionMetaView,
        FlowMeta, FlowPayload, FlowResponse, FlowSectionView, FlowView, PointsMeta, ScenarioView,
        SessionRecordView, TalkingPointView, TalkingPointsPayload, TalkingPointsResponse,
        TtsPayload,
    },
    state::AppState,
    ws::ws_handler,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest accepted upload for text extraction.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_scenarios,
        handlers::get_scenario,
        handlers::generate_talking_points,
        handlers::generate_flow,
        handlers::extract_text,
        handlers::synthesize_speech,
        handlers::list_records,
        handlers::create_record,
    ),
    components(
        schemas(
            ScenarioView, AgentView, TalkingPointView, FlowSectionView, FlowView,
            TalkingPointsPayload, TalkingPointsResponse, PointsMeta,
            FlowPayload, FlowResponse, FlowMeta,
            ExtractTextForm, ExtractTextResponse, ExtractionMetaView,
            TtsPayload, SessionRecordView, ErrorResponse
        )
    ),
    tags(
        (name = "Podium API", description = "Scenario catalog, preparation helpers and practice sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/scenarios", get(handlers::list_scenarios))
        .route("/scenarios/{id}", get(handlers::get_scenario))
        .route(
            "/analyze/talking-points",
            post(handlers::generate_talking_points),
        )
        .route("/analyze/flow", post(handlers::generate_flow))
        .route(
            "/extract-text",
            post(handlers::extract_text).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/tts", post(handlers::synthesize_speech))
        .route(
            "/records",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::records::RecordStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use bytes::Bytes;
    use podium_core::{
        composer::ResponseComposer,
        extraction::{
            ExtractedDocument, ExtractionError, ExtractionMeta, TextExtractor, UploadedFile,
        },
        speech::{AudioClip, SpeechRequest, SpeechSynthesizer, UpstreamStatus},
        talking_points::{
            FlowRequest, GenerationError, MockTalkingPointService, PointsRequest,
            TalkingPointService,
        },
        topic::{PresentationalFlow, TalkingPoint},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct EchoExtractor;

    #[async_trait]
    impl TextExtractor for EchoExtractor {
        async fn extract(&self, file: &UploadedFile) -> Result<ExtractedDocument> {
            let text = String::from_utf8_lossy(&file.data).into_owned();
            Ok(ExtractedDocument {
                meta: ExtractionMeta {
                    pages: 1,
                    chars: text.len(),
                    file_type: file.kind(),
                    processed_by: None,
                },
                text,
            })
        }
    }

    struct RefusingExtractor(ExtractionError);

    #[async_trait]
    impl TextExtractor for RefusingExtractor {
        async fn extract(&self, file: &UploadedFile) -> Result<ExtractedDocument> {
            Err(anyhow::Error::new(self.0)
                .context(format!("Failed to extract text from '{}'", file.filename)))
        }
    }

    struct StubSpeech {
        status: Option<u16>,
    }

    #[async_trait]
    impl SpeechSynthesizer for StubSpeech {
        async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioClip> {
            if let Some(status) = self.status {
                return Err(UpstreamStatus { status }.into());
            }
            Ok(AudioClip {
                data: Bytes::from(format!("mp3:{}", request.reference_id())),
                content_type: "audio/mpeg".to_string(),
            })
        }
    }

    struct GarbledModel;

    #[async_trait]
    impl TalkingPointService for GarbledModel {
        async fn generate_points(&self, _: &PointsRequest) -> Result<Vec<TalkingPoint>> {
            Err(GenerationError::Unparseable {
                what: "talking points",
                raw: "???".to_string(),
            }
            .into())
        }

        async fn generate_flow(&self, _: &FlowRequest) -> Result<PresentationalFlow> {
            Err(anyhow::anyhow!("connection reset"))
        }

        fn model(&self) -> String {
            "garbled".to_string()
        }
    }

    pub(crate) fn test_state() -> AppState {
        AppState {
            composer: Arc::new(ResponseComposer::default()),
            talking_points: Arc::new(MockTalkingPointService),
            extractor: Arc::new(EchoExtractor),
            speech: Some(Arc::new(StubSpeech { status: None })),
            records: Arc::new(RecordStore::new()),
        }
    }

    fn app(state: AppState) -> Router {
        create_router(Arc::new(state))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_and_get_scenarios() {
        let (status, body) = send(app(test_state()), get("/scenarios")).await;
        assert_eq!(status, StatusCode::OK);
        let list: Vec<ScenarioView> = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.len(), 5);

        let (status, body) = send(app(test_state()), get("/scenarios/presentation")).await;
        assert_eq!(status, StatusCode::OK);
        let scenario: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(scenario["participant_count"], 5);
        assert_eq!(scenario["presentational"], true);
    }

    #[tokio::test]
    async fn test_unknown_scenario_is_404() {
        let (status, body) = send(app(test_state()), get("/scenarios/karaoke")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["message"], "Scenario 'karaoke' not found");
    }

    #[tokio::test]
    async fn test_generate_talking_points() {
        let request = post_json(
            "/analyze/talking-points",
            json!({ "context": "Negotiate salary and remote work", "count_min": 2, "count_max": 3 }),
        );
        let (status, body) = send(app(test_state()), request).await;
        assert_eq!(status, StatusCode::OK);
        let response: TalkingPointsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.points.len(), 3);
        assert_eq!(response.meta.count, 3);
        assert_eq!(response.meta.model, "mock");
        assert_eq!(response.points[0].text, "negotiate");
    }

    #[tokio::test]
    async fn test_talking_point_counts_are_bounded() {
        let request = post_json(
            "/analyze/talking-points",
            json!({ "context": "garden budget", "count_min": 100_000_000, "count_max": 1 }),
        );
        let (status, body) = send(app(test_state()), request).await;
        assert_eq!(status, StatusCode::OK);
        let response: TalkingPointsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.points.len(), 30);
        assert_eq!(response.meta.count, 30);
    }

    #[tokio::test]
    async fn test_talking_points_validation() {
        let (status, _) = send(
            app(test_state()),
            post_json("/analyze/talking-points", json!({ "context": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(test_state()),
            post_json("/analyze/talking-points", json!({ "count_min": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_model_failures_map_to_status_codes() {
        let state = AppState {
            talking_points: Arc::new(GarbledModel),
            ..test_state()
        };

        let (status, body) = send(
            app(state.clone()),
            post_json("/analyze/talking-points", json!({ "context": "pitch" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            error["message"],
            "Failed to parse talking points from model output"
        );

        let (status, _) = send(
            app(state),
            post_json("/analyze/flow", json!({ "context": "pitch" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_generate_flow() {
        let request = post_json(
            "/analyze/flow",
            json!({ "context": "garden", "sections_min": 3, "sections_max": 3 }),
        );
        let (status, body) = send(app(test_state()), request).await;
        assert_eq!(status, StatusCode::OK);
        let response: FlowResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.flow.sections.len(), 3);
        assert_eq!(response.flow.intro.title, "Introduction");
        assert_eq!(response.flow.qa.title, "Q&A");
    }

    fn multipart(field: &str, filename: &str, content_type: &str, data: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n--{b}--\r\n",
            b = boundary,
        );
        Request::builder()
            .method("POST")
            .uri("/extract-text")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extract_text_from_upload() {
        let request = multipart("file", "notes.md", "text/markdown", "# Agenda");
        let (status, body) = send(app(test_state()), request).await;
        assert_eq!(status, StatusCode::OK);
        let response: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(response["text"], "# Agenda");
        assert_eq!(response["meta"]["file_type"], "text");
        assert_eq!(response["meta"]["pages"], 1);
    }

    #[tokio::test]
    async fn test_extract_text_requires_file_field() {
        let request = multipart("attachment", "notes.md", "text/markdown", "# Agenda");
        let (status, body) = send(app(test_state()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["message"], "A 'file' field is required");
    }

    #[tokio::test]
    async fn test_extraction_refusals_keep_their_status() {
        for (refusal, expected) in [
            (ExtractionError::InvalidApiKey, StatusCode::UNAUTHORIZED),
            (ExtractionError::QuotaExceeded, StatusCode::TOO_MANY_REQUESTS),
            (ExtractionError::FileTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
        ] {
            let state = AppState {
                extractor: Arc::new(RefusingExtractor(refusal)),
                ..test_state()
            };
            let request = multipart("file", "deck.pdf", "application/pdf", "%PDF");
            let (status, body) = send(app(state), request).await;
            assert_eq!(status, expected);
            let error: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(error["message"], refusal.to_string());
        }
    }

    #[tokio::test]
    async fn test_tts_returns_audio() {
        let request = post_json("/tts", json!({ "text": "(happy) Hi!", "voice_id": "v9" }));
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"mp3:v9");
    }

    #[tokio::test]
    async fn test_tts_errors() {
        let (status, _) = send(app(test_state()), post_json("/tts", json!({ "text": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let disabled = AppState {
            speech: None,
            ..test_state()
        };
        let (status, _) = send(app(disabled), post_json("/tts", json!({ "text": "Hi" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let failing = AppState {
            speech: Some(Arc::new(StubSpeech { status: Some(429) })),
            ..test_state()
        };
        let (status, body) = send(app(failing), post_json("/tts", json!({ "text": "Hi" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["message"], "TTS API error: 429");
    }

    #[tokio::test]
    async fn test_records_round_trip() {
        let state = test_state();
        let record = json!({
            "scenario_id": "party",
            "date": "2024-01-15T10:30:00Z",
            "score": 132,
            "duration": 95,
            "difficulty": "easy"
        });

        let (status, _) = send(app(state.clone()), post_json("/records", record.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(app(state.clone()), get("/records")).await;
        assert_eq!(status, StatusCode::OK);
        let records: Vec<SessionRecordView> = serde_json::from_slice(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 132);

        let (_, body) = send(app(state), get("/records?scenario_id=classroom")).await;
        let records: Vec<SessionRecordView> = serde_json::from_slice(&body).unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_record_for_unknown_scenario_rejected() {
        let record = json!({
            "scenario_id": "karaoke",
            "date": "2024-01-15T10:30:00Z",
            "score": 1,
            "duration": 1,
            "difficulty": "easy"
        });
        let (status, _) = send(app(test_state()), post_json("/records", record)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/scenarios",
            "/scenarios/{id}",
            "/analyze/talking-points",
            "/analyze/flow",
            "/extract-text",
            "/tts",
            "/records",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "{}", expected);
        }
    }
}
