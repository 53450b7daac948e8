//! Fake service and toolkit implementations shared by unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{DubError, FetchError, FetchErrorKind, RecognizeError, Result};
use crate::fetch::VideoFetcher;
use crate::media::MediaToolkit;
use crate::services::{LipSyncRenderer, SpeechRecognizer, SpeechSynthesizer, Translator};

const DEFAULT_DURATION: f64 = 30.0;

/// In-memory media toolkit that works on real scratch files so cleanup
/// behavior can be asserted against the filesystem.
pub struct FakeMedia {
    durations: Mutex<HashMap<PathBuf, f64>>,
    fail_extract: bool,
    fail_remux: bool,
    concat_calls: AtomicUsize,
    trim_calls: AtomicUsize,
    remux_calls: AtomicUsize,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            durations: Mutex::new(HashMap::new()),
            fail_extract: false,
            fail_remux: false,
            concat_calls: AtomicUsize::new(0),
            trim_calls: AtomicUsize::new(0),
            remux_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_duration(self, path: &Path, seconds: f64) -> Self {
        self.durations
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), seconds);
        self
    }

    pub fn failing_extract(mut self) -> Self {
        self.fail_extract = true;
        self
    }

    pub fn failing_remux(mut self) -> Self {
        self.fail_remux = true;
        self
    }

    pub fn concat_calls(&self) -> usize {
        self.concat_calls.load(Ordering::SeqCst)
    }

    pub fn trim_calls(&self) -> usize {
        self.trim_calls.load(Ordering::SeqCst)
    }

    pub fn remux_calls(&self) -> usize {
        self.remux_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn extract_audio(&self, _video: &Path, audio_out: &Path, _sample_rate: u32) -> Result<()> {
        if self.fail_extract {
            return Err(DubError::Decode("fake decode failure".to_string()));
        }
        tokio::fs::write(audio_out, b"pcm").await?;
        Ok(())
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        Ok(self
            .durations
            .lock()
            .unwrap()
            .get(media)
            .copied()
            .unwrap_or(DEFAULT_DURATION))
    }

    async fn slice_audio(
        &self,
        _audio: &Path,
        _offset: f64,
        _duration: f64,
        out: &Path,
    ) -> Result<()> {
        tokio::fs::write(out, b"window").await?;
        Ok(())
    }

    async fn concat_audio(&self, segments: &[PathBuf], out: &Path) -> Result<()> {
        self.concat_calls.fetch_add(1, Ordering::SeqCst);
        let mut combined = Vec::new();
        for segment in segments {
            combined.extend(tokio::fs::read(segment).await?);
        }
        tokio::fs::write(out, combined).await?;
        Ok(())
    }

    async fn trim_audio(&self, audio: &Path, _max_seconds: f64, out: &Path) -> Result<()> {
        self.trim_calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::copy(audio, out).await?;
        Ok(())
    }

    async fn replace_audio(&self, _video: &Path, _audio: &Path, out: &Path) -> Result<()> {
        self.remux_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_remux {
            // A failed mux may leave a partial container behind.
            tokio::fs::write(out, b"partial").await?;
            return Err(DubError::Decode("fake mux failure".to_string()));
        }
        tokio::fs::write(out, b"muxed").await?;
        Ok(())
    }
}

/// Recognizer driven by a scripted queue of per-call results.
pub struct FakeRecognizer {
    responses: Mutex<VecDeque<std::result::Result<String, RecognizeError>>>,
    languages: Mutex<Vec<Option<String>>>,
}

impl FakeRecognizer {
    pub fn scripted(responses: Vec<std::result::Result<String, RecognizeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.languages.lock().unwrap().len()
    }

    pub fn languages(&self) -> Vec<Option<String>> {
        self.languages.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn recognize(
        &self,
        _audio: &Path,
        language: Option<&str>,
    ) -> std::result::Result<String, RecognizeError> {
        self.languages
            .lock()
            .unwrap()
            .push(language.map(str::to_string));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RecognizeError::NoSpeech))
    }
}

/// Translator that tags the text with the target language, or fails.
pub struct FakeTranslator {
    fail: bool,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        if self.fail {
            return Err(DubError::Translation("fake translation outage".to_string()));
        }
        Ok(format!("[{target_language}] {text}"))
    }
}

/// Synthesizer that writes the chunk text as the audio segment.
pub struct FakeSynthesizer {
    fail: bool,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, _language: &str, out: &Path) -> Result<()> {
        if self.fail {
            return Err(DubError::Synthesis("fake synthesis outage".to_string()));
        }
        tokio::fs::write(out, text.as_bytes()).await?;
        Ok(())
    }
}

/// Lip-sync renderer that either writes the output or always fails.
pub struct FakeLipSync {
    succeed: bool,
}

impl FakeLipSync {
    pub fn succeeding() -> Self {
        Self { succeed: true }
    }

    pub fn failing() -> Self {
        Self { succeed: false }
    }
}

#[async_trait]
impl LipSyncRenderer for FakeLipSync {
    async fn render(&self, _video: &Path, _audio: &Path, out: &Path) -> Result<()> {
        if !self.succeed {
            return Err(DubError::Assembly("fake lip-sync failure".to_string()));
        }
        tokio::fs::write(out, b"lipsynced").await?;
        Ok(())
    }
}

/// Fetcher that materializes a fake source video, or fails with a
/// classified error.
pub struct FakeFetcher {
    failure: Option<FetchErrorKind>,
}

impl FakeFetcher {
    pub fn succeeding() -> Self {
        Self { failure: None }
    }

    pub fn failing(kind: FetchErrorKind) -> Self {
        Self {
            failure: Some(kind),
        }
    }
}

#[async_trait]
impl VideoFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str, dest_dir: &Path) -> Result<PathBuf> {
        if let Some(kind) = self.failure {
            return Err(FetchError::new(kind, "fake download error").into());
        }
        let path = dest_dir.join("source.mp4");
        tokio::fs::write(&path, b"video").await?;
        Ok(path)
    }
}
