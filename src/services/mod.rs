pub mod google;
pub mod lipsync;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{RecognizeError, Result};

/// Speech recognition over one bounded audio window.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize speech in the audio file. `language` is a hint; `None`
    /// requests service-side detection. Returns the recognized text, or a
    /// [`RecognizeError`] describing why nothing usable came back.
    async fn recognize(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> std::result::Result<String, RecognizeError>;
}

/// Text translation into a target language. Required stage: any failure is
/// fatal to the job and the caller does not retry.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Text-to-speech for one byte-bounded text chunk.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the given language and write one audio segment
    /// to `out`.
    async fn synthesize(&self, text: &str, language: &str, out: &Path) -> Result<()>;
}

/// Lip-sync rendering: given the original video and the dubbed audio, produce
/// a new video with aligned lip movement. Failure of any kind makes the
/// assembly stage fall back to a plain re-mux.
#[async_trait]
pub trait LipSyncRenderer: Send + Sync {
    async fn render(&self, video: &Path, audio: &Path, out: &Path) -> Result<()>;
}

/// The full set of external service handles one job needs, bundled so the
/// orchestrator takes a single injected value.
#[derive(Clone)]
pub struct ServiceHandles {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub lip_sync: Arc<dyn LipSyncRenderer>,
}

/// Build production service handles from configuration.
pub fn create_services(config: &Config) -> Result<ServiceHandles> {
    Ok(ServiceHandles {
        recognizer: Arc::new(google::GoogleSpeechClient::new(&config.recognition)?),
        translator: Arc::new(google::GoogleTranslateClient::new(&config.translation)?),
        synthesizer: Arc::new(google::GoogleTtsClient::new(&config.synthesis)?),
        lip_sync: Arc::new(lipsync::Wav2LipRenderer::new(config.lipsync.clone())),
    })
}
