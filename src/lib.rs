/// Video Dubber
///
/// Asynchronous media-dubbing pipeline: extract speech audio from a video,
/// transcribe it in bounded windows, translate the transcript, synthesize
/// speech in the target language, and re-mux (optionally lip-synced) into an
/// output video.

pub mod chunk;
pub mod config;
pub mod error;
pub mod fetch;
pub mod job;
pub mod media;
pub mod registry;
pub mod services;
pub mod stages;

#[cfg(feature = "api")]
pub mod api;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for easy access
pub use crate::config::Config;
pub use crate::error::{DubError, FetchError, FetchErrorKind, RecognizeError};
pub use crate::fetch::{VideoFetcher, YtDlpFetcher};
pub use crate::job::{JobOrchestrator, JobOutcome, JobSource, ProgressSink, Stage};
pub use crate::media::{FfmpegToolkit, MediaToolkit};
pub use crate::registry::{JobRegistry, JobStatus};
pub use crate::services::{
    create_services, LipSyncRenderer, ServiceHandles, SpeechRecognizer, SpeechSynthesizer,
    Translator,
};
pub use crate::stages::StageResult;
