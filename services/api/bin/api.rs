//! Main Entrypoint for the Podium API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing the model-backed collaborators (talking points, extraction, speech).
//! 3. Loading the phrase book that feeds the response composer.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use podium_api::{
    config::Config, records::RecordStore, router::create_router, state::AppState,
};
use podium_core::{
    composer::ResponseComposer,
    extraction::LLMTextExtractor,
    llm_client::{LLMClient, OpenAICompatibleClient},
    phrases::PhraseBook,
    speech::{HttpSpeechSynthesizer, SpeechSynthesizer},
    talking_points::LLMTalkingPointService,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn speech_synthesizer(config: &Config) -> Option<Arc<dyn SpeechSynthesizer>> {
    if !config.tts.enabled {
        info!("Text-to-speech disabled.");
        return None;
    }
    match &config.tts.endpoint {
        Some(endpoint) => Some(Arc::new(HttpSpeechSynthesizer::new(
            endpoint.clone(),
            config.tts.api_key.clone().unwrap_or_default(),
        ))),
        None => {
            warn!("TTS_ENABLED is set but TTS_ENDPOINT is missing; speech stays disabled.");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let api_key = config
        .api_key()
        .context("No API key configured for the selected provider")?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(config.api_base());
    let llm_client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
    ));

    let phrases = match &config.phrases_path {
        Some(path) => PhraseBook::from_path(path)?,
        None => PhraseBook::default(),
    };

    let app_state = Arc::new(AppState {
        composer: Arc::new(ResponseComposer::new(phrases)),
        talking_points: Arc::new(LLMTalkingPointService::with_default_prompts(
            llm_client.clone(),
        )),
        extractor: Arc::new(LLMTextExtractor::new(llm_client)),
        speech: speech_synthesizer(&config),
        records: Arc::new(RecordStore::new()),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        tts = config.tts.enabled,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
