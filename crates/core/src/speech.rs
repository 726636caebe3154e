//! Speech Synthesis and Playback Queue
//!
//! Agent lines are voiced by an external text-to-speech endpoint. Playback is
//! strictly sequential: a [`SpeechQueue`] owns the pending clips and drives an
//! injected [`PlaybackBackend`] so that at most one clip is audible at a time.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Voice used when the speaking agent has none of its own.
pub const DEFAULT_REFERENCE_ID: &str = "bf322df2096a46f18c579d0baa36f41d";
const TTS_MODEL: &str = "s1";
const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeechRequest {
    /// Spoken verbatim, including any leading emotion markers.
    pub text: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl SpeechRequest {
    pub fn reference_id(&self) -> &str {
        self.voice_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_REFERENCE_ID)
    }
}

#[derive(Debug, Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    format: &'a str,
    reference_id: &'a str,
}

/// Synthesized audio ready to play or forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Bytes,
    pub content_type: String,
}

/// The TTS endpoint answered with a non-success status.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("TTS API error: {status}")]
pub struct UpstreamStatus {
    pub status: u16,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioClip>;
}

/// Posts lines to a Fish Audio style HTTP endpoint.
pub struct HttpSpeechSynthesizer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpSpeechSynthesizer {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioClip> {
        let body = TtsBody {
            text: &request.text,
            format: "mp3",
            reference_id: request.reference_id(),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("model", TTS_MODEL)
            .json(&body)
            .send()
            .await
            .context("TTS request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "TTS endpoint rejected request");
            return Err(UpstreamStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_AUDIO_TYPE)
            .to_string();
        let data = response
            .bytes()
            .await
            .context("Failed to read TTS audio")?;
        debug!(
            agent = request.agent_name.as_deref().unwrap_or("-"),
            bytes = data.len(),
            "Synthesized speech"
        );
        Ok(AudioClip { data, content_type })
    }
}

/// Something that can make a clip audible.
///
/// `play` should return once playback has started; the owner reports the end
/// through [`SpeechQueue::on_playback_finished`] or
/// [`SpeechQueue::on_playback_error`].
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackBackend {
    fn play(&mut self, clip: &AudioClip) -> Result<()>;
    fn stop(&mut self);
}

/// FIFO of clips waiting to be played, one at a time.
pub struct SpeechQueue<B: PlaybackBackend> {
    backend: B,
    pending: VecDeque<AudioClip>,
    current: Option<AudioClip>,
    enabled: bool,
}

impl<B: PlaybackBackend> SpeechQueue<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pending: VecDeque::new(),
            current: None,
            enabled: true,
        }
    }

    /// Queues a clip, starting it at once if nothing is playing.
    ///
    /// A disabled queue drops the clip and returns `false`.
    pub fn enqueue(&mut self, clip: AudioClip) -> bool {
        if !self.enabled {
            debug!("Speech disabled, dropping clip");
            return false;
        }
        self.pending.push_back(clip);
        if self.current.is_none() {
            self.start_next();
        }
        true
    }

    pub fn on_playback_finished(&mut self) {
        self.current = None;
        self.start_next();
    }

    pub fn on_playback_error(&mut self, reason: &str) {
        warn!(reason, "Playback failed, moving to next clip");
        self.current = None;
        self.start_next();
    }

    /// Stops the audible clip and moves on to the next one.
    pub fn skip_current(&mut self) {
        if self.current.take().is_some() {
            self.backend.stop();
        }
        self.start_next();
    }

    /// Stops playback and forgets every queued clip.
    pub fn stop_all(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        if self.current.take().is_some() {
            self.backend.stop();
        }
        info!(dropped, "Speech queue cleared");
    }

    /// Disabling stops everything and makes later `enqueue` calls no-ops.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop_all();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&AudioClip> {
        self.current.as_ref()
    }

    /// Clips queued or playing.
    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn start_next(&mut self) {
        while let Some(clip) = self.pending.pop_front() {
            match self.backend.play(&clip) {
                Ok(()) => {
                    self.current = Some(clip);
                    return;
                }
                Err(e) => warn!(error = %e, "Could not start clip, skipping"),
            }
        }
    }
}
