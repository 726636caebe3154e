//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the response composer and collaborator clients.

use crate::records::RecordStore;
use podium_core::{
    composer::ResponseComposer, extraction::TextExtractor, speech::SpeechSynthesizer,
    talking_points::TalkingPointService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<ResponseComposer>,
    pub talking_points: Arc<dyn TalkingPointService>,
    pub extractor: Arc<dyn TextExtractor>,
    /// `None` when text-to-speech is disabled or has no endpoint.
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
    pub records: Arc<RecordStore>,
}
