use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::DubError;
use crate::fetch::VideoFetcher;
use crate::media::MediaToolkit;
use crate::services::ServiceHandles;
use crate::stages::{self, StageResult, TranscribeOptions};

/// Informational message for content with nothing to dub.
pub const NO_SPEECH_MESSAGE: &str =
    "This video appears to have minimal or no speech to translate. Please try a video with more dialogue.";

/// Where a job's source video comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobSource {
    /// A video already on local storage (uploaded through the boundary).
    Upload(PathBuf),
    /// A remote URL to fetch before processing.
    Url(String),
}

/// Pipeline stages, in execution order. Each carries the human-readable
/// progress label reported to the status boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Fetching,
    Extracting,
    Transcribing,
    Translating,
    Synthesizing,
    Assembling,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Fetching => "Downloading video...",
            Stage::Extracting => "Extracting audio...",
            Stage::Transcribing => "Transcribing audio...",
            Stage::Translating => "Translating text...",
            Stage::Synthesizing => "Generating speech...",
            Stage::Assembling => "Creating final video...",
        }
    }
}

/// Terminal result of a job. A job reaches exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobOutcome {
    /// The dubbed video was produced; `output` survives past the job.
    Succeeded { output: PathBuf },
    /// Not an error: the content had no speech to dub.
    NoSpeech { message: String },
    /// The job failed; `message` is user-facing.
    Failed { message: String },
}

/// Stage-transition observer. The task-result store implements this to make
/// per-stage progress visible to polling clients.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn stage_started(&self, job_id: &str, stage: Stage);
}

/// Drives one dubbing job end-to-end.
///
/// All external effects go through injected handles, every intermediate
/// artifact lives in a job-unique scratch directory, and the orchestrator
/// never propagates an error past its own boundary: the outcome is always a
/// structured [`JobOutcome`].
pub struct JobOrchestrator {
    media: Arc<dyn MediaToolkit>,
    services: ServiceHandles,
    fetcher: Arc<dyn VideoFetcher>,
    progress: Arc<dyn ProgressSink>,
    sample_rate: u32,
    transcribe_opts: TranscribeOptions,
    max_chunk_bytes: usize,
    output_dir: PathBuf,
}

impl JobOrchestrator {
    pub fn new(
        media: Arc<dyn MediaToolkit>,
        services: ServiceHandles,
        fetcher: Arc<dyn VideoFetcher>,
        progress: Arc<dyn ProgressSink>,
        config: &Config,
    ) -> Self {
        Self {
            media,
            services,
            fetcher,
            progress,
            sample_rate: config.audio.sample_rate,
            transcribe_opts: TranscribeOptions {
                window_seconds: config.audio.window_seconds,
                language_hint: config.recognition.language_hint.clone(),
            },
            max_chunk_bytes: config.synthesis.max_chunk_bytes,
            output_dir: config.output.output_dir.clone(),
        }
    }

    /// Run one job to its terminal state.
    ///
    /// Cleanup of the scratch directory (and everything in it: downloaded
    /// source, extracted audio, window slices, synthesis segments) happens on
    /// every terminal path. Cleanup failures are logged and never change the
    /// already-determined outcome.
    pub async fn run(&self, job_id: &str, source: JobSource, target_language: &str) -> JobOutcome {
        info!("🚀 Starting dubbing job {} -> {}", job_id, target_language);

        let scratch = match tempfile::Builder::new()
            .prefix(&format!("dub-{job_id}-"))
            .tempdir()
        {
            Ok(dir) => dir,
            Err(e) => {
                error!("Could not create scratch directory for {}: {}", job_id, e);
                return JobOutcome::Failed {
                    message: DubError::Io(e).to_string(),
                };
            }
        };

        let outcome = self
            .run_stages(job_id, &source, target_language, scratch.path())
            .await;

        if let Err(e) = scratch.close() {
            warn!("Scratch cleanup failed for {}: {}", job_id, e);
        }

        match &outcome {
            JobOutcome::Succeeded { output } => {
                info!("🎉 Job {} completed: {}", job_id, output.display());
            }
            JobOutcome::NoSpeech { .. } => {
                info!("ℹ️ Job {} ended with no speech to dub", job_id);
            }
            JobOutcome::Failed { message } => {
                warn!("❌ Job {} failed: {}", job_id, message);
            }
        }

        outcome
    }

    async fn run_stages(
        &self,
        job_id: &str,
        source: &JobSource,
        target_language: &str,
        scratch: &Path,
    ) -> JobOutcome {
        let video_path = match source {
            JobSource::Upload(path) => path.clone(),
            JobSource::Url(url) => {
                self.progress.stage_started(job_id, Stage::Fetching).await;
                match self.fetcher.fetch(url, scratch).await {
                    Ok(path) => path,
                    Err(e) => return self.fail(job_id, e),
                }
            }
        };

        self.progress.stage_started(job_id, Stage::Extracting).await;
        let audio_path = scratch.join("audio.wav");
        if let Err(e) = self
            .media
            .extract_audio(&video_path, &audio_path, self.sample_rate)
            .await
        {
            return self.fail(job_id, e);
        }

        self.progress.stage_started(job_id, Stage::Transcribing).await;
        let transcript = match stages::transcribe(
            self.media.as_ref(),
            self.services.recognizer.as_ref(),
            &audio_path,
            scratch,
            &self.transcribe_opts,
        )
        .await
        {
            StageResult::Ok(text) => text,
            StageResult::Empty => {
                return JobOutcome::NoSpeech {
                    message: NO_SPEECH_MESSAGE.to_string(),
                }
            }
            StageResult::Failed(e) => return self.fail(job_id, e),
        };
        info!("📝 Transcript: {} characters", transcript.len());

        self.progress.stage_started(job_id, Stage::Translating).await;
        let translated = match self
            .services
            .translator
            .translate(&transcript, target_language)
            .await
        {
            Ok(text) => text,
            Err(e) => return self.fail(job_id, e),
        };
        info!("🌍 Translation: {} characters", translated.len());

        self.progress.stage_started(job_id, Stage::Synthesizing).await;
        let synth_path = match stages::synthesize(
            self.media.as_ref(),
            self.services.synthesizer.as_ref(),
            &translated,
            target_language,
            scratch,
            self.max_chunk_bytes,
        )
        .await
        {
            StageResult::Ok(path) => path,
            // Translation of a non-empty transcript came back blank; there is
            // nothing speakable to dub.
            StageResult::Empty => {
                return JobOutcome::NoSpeech {
                    message: NO_SPEECH_MESSAGE.to_string(),
                }
            }
            StageResult::Failed(e) => return self.fail(job_id, e),
        };

        self.progress.stage_started(job_id, Stage::Assembling).await;
        let output_path = self.output_dir.join(format!("{job_id}.mp4"));
        match stages::assemble(
            self.media.as_ref(),
            self.services.lip_sync.as_ref(),
            &video_path,
            &synth_path,
            &output_path,
            scratch,
        )
        .await
        {
            StageResult::Ok(output) => JobOutcome::Succeeded { output },
            StageResult::Empty => self.fail(
                job_id,
                DubError::Assembly("assembly produced no output".to_string()),
            ),
            StageResult::Failed(e) => self.fail(job_id, e),
        }
    }

    fn fail(&self, job_id: &str, error: DubError) -> JobOutcome {
        error!("Job {} stage error: {}", job_id, error.detail());
        JobOutcome::Failed {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{FetchErrorKind, RecognizeError};
    use crate::testutil::{
        FakeFetcher, FakeLipSync, FakeMedia, FakeRecognizer, FakeSynthesizer, FakeTranslator,
    };
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingSink {
        stages: Mutex<Vec<Stage>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                stages: Mutex::new(Vec::new()),
            }
        }

        fn stages(&self) -> Vec<Stage> {
            self.stages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn stage_started(&self, _job_id: &str, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }
    }

    struct Harness {
        orchestrator: JobOrchestrator,
        sink: Arc<RecordingSink>,
        output_dir: TempDir,
        // Held so uploaded source files outlive the job.
        upload_dir: TempDir,
    }

    fn harness(
        media: FakeMedia,
        recognizer: FakeRecognizer,
        translator: FakeTranslator,
        synthesizer: FakeSynthesizer,
        lip_sync: FakeLipSync,
        fetcher: FakeFetcher,
    ) -> Harness {
        let output_dir = TempDir::new().unwrap();
        let upload_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.output_dir = output_dir.path().to_path_buf();

        let sink = Arc::new(RecordingSink::new());
        let services = ServiceHandles {
            recognizer: Arc::new(recognizer),
            translator: Arc::new(translator),
            synthesizer: Arc::new(synthesizer),
            lip_sync: Arc::new(lip_sync),
        };
        let orchestrator = JobOrchestrator::new(
            Arc::new(media),
            services,
            Arc::new(fetcher),
            sink.clone(),
            &config,
        );

        Harness {
            orchestrator,
            sink,
            output_dir,
            upload_dir,
        }
    }

    async fn upload_source(h: &Harness) -> PathBuf {
        let path = h.upload_dir.path().join("source.mp4");
        tokio::fs::write(&path, b"video").await.unwrap();
        path
    }

    fn scratch_dirs_for(job_id: &str) -> Vec<PathBuf> {
        let prefix = format!("dub-{job_id}-");
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(&prefix))
            })
            .collect()
    }

    #[tokio::test]
    async fn successful_job_produces_output_and_cleans_scratch() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![Ok("hello there".to_string())]),
            FakeTranslator::new(),
            FakeSynthesizer::new(),
            FakeLipSync::succeeding(),
            FakeFetcher::succeeding(),
        );
        let source = upload_source(&h).await;

        let outcome = h
            .orchestrator
            .run("job-success", JobSource::Upload(source), "es")
            .await;

        match outcome {
            JobOutcome::Succeeded { output } => {
                assert!(output.exists());
                assert_eq!(output, h.output_dir.path().join("job-success.mp4"));
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(scratch_dirs_for("job-success").is_empty());
        assert_eq!(
            h.sink.stages(),
            vec![
                Stage::Extracting,
                Stage::Transcribing,
                Stage::Translating,
                Stage::Synthesizing,
                Stage::Assembling,
            ]
        );
    }

    #[tokio::test]
    async fn silent_video_ends_informational_with_no_output() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![Err(RecognizeError::NoSpeech)]),
            FakeTranslator::new(),
            FakeSynthesizer::new(),
            FakeLipSync::succeeding(),
            FakeFetcher::succeeding(),
        );
        let source = upload_source(&h).await;

        let outcome = h
            .orchestrator
            .run("job-silent", JobSource::Upload(source), "es")
            .await;

        match outcome {
            JobOutcome::NoSpeech { message } => {
                assert_eq!(message, NO_SPEECH_MESSAGE);
            }
            other => panic!("expected NoSpeech, got {other:?}"),
        }
        assert!(!h.output_dir.path().join("job-silent.mp4").exists());
        assert!(scratch_dirs_for("job-silent").is_empty());
        // Remaining stages were skipped.
        assert_eq!(
            h.sink.stages(),
            vec![Stage::Extracting, Stage::Transcribing]
        );
    }

    #[tokio::test]
    async fn extraction_failure_fails_the_job() {
        let h = harness(
            FakeMedia::new().failing_extract(),
            FakeRecognizer::scripted(vec![]),
            FakeTranslator::new(),
            FakeSynthesizer::new(),
            FakeLipSync::succeeding(),
            FakeFetcher::succeeding(),
        );
        let source = upload_source(&h).await;

        let outcome = h
            .orchestrator
            .run("job-decode", JobSource::Upload(source), "es")
            .await;

        match outcome {
            JobOutcome::Failed { message } => {
                assert!(message.contains("could not be read"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(scratch_dirs_for("job-decode").is_empty());
    }

    #[tokio::test]
    async fn translation_outage_fails_without_output() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![Ok("hello".to_string())]),
            FakeTranslator::failing(),
            FakeSynthesizer::new(),
            FakeLipSync::succeeding(),
            FakeFetcher::succeeding(),
        );
        let source = upload_source(&h).await;

        let outcome = h
            .orchestrator
            .run("job-translate", JobSource::Upload(source), "es")
            .await;

        match outcome {
            JobOutcome::Failed { message } => {
                assert!(message.contains("translation service"));
                // Internal detail stays in the logs, not the user message.
                assert!(!message.contains("fake translation outage"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!h.output_dir.path().join("job-translate.mp4").exists());
        assert!(scratch_dirs_for("job-translate").is_empty());
    }

    #[tokio::test]
    async fn synthesis_failure_fails_the_job() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![Ok("hello".to_string())]),
            FakeTranslator::new(),
            FakeSynthesizer::failing(),
            FakeLipSync::succeeding(),
            FakeFetcher::succeeding(),
        );
        let source = upload_source(&h).await;

        let outcome = h
            .orchestrator
            .run("job-synth", JobSource::Upload(source), "es")
            .await;

        assert!(matches!(outcome, JobOutcome::Failed { .. }));
        assert!(scratch_dirs_for("job-synth").is_empty());
    }

    #[tokio::test]
    async fn lip_sync_failure_falls_back_to_remux_and_succeeds() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![Ok("hello".to_string())]),
            FakeTranslator::new(),
            FakeSynthesizer::new(),
            FakeLipSync::failing(),
            FakeFetcher::succeeding(),
        );
        let source = upload_source(&h).await;

        let outcome = h
            .orchestrator
            .run("job-fallback", JobSource::Upload(source), "es")
            .await;

        match outcome {
            JobOutcome::Succeeded { output } => assert!(output.exists()),
            other => panic!("expected success via fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn url_job_fetches_then_processes() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![Ok("hello".to_string())]),
            FakeTranslator::new(),
            FakeSynthesizer::new(),
            FakeLipSync::succeeding(),
            FakeFetcher::succeeding(),
        );

        let outcome = h
            .orchestrator
            .run(
                "job-url",
                JobSource::Url("https://example.com/watch?v=abc".to_string()),
                "fr",
            )
            .await;

        assert!(matches!(outcome, JobOutcome::Succeeded { .. }));
        assert_eq!(h.sink.stages()[0], Stage::Fetching);
        // Downloaded source lived in scratch and is gone with it.
        assert!(scratch_dirs_for("job-url").is_empty());
    }

    #[tokio::test]
    async fn private_video_surfaces_classified_message() {
        let h = harness(
            FakeMedia::new(),
            FakeRecognizer::scripted(vec![]),
            FakeTranslator::new(),
            FakeSynthesizer::new(),
            FakeLipSync::succeeding(),
            FakeFetcher::failing(FetchErrorKind::Private),
        );

        let outcome = h
            .orchestrator
            .run(
                "job-private",
                JobSource::Url("https://example.com/watch?v=abc".to_string()),
                "fr",
            )
            .await;

        match outcome {
            JobOutcome::Failed { message } => {
                assert_eq!(message, "Cannot process private videos");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
