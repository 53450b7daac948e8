use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::chunk::{split_text, WindowPlan};
use crate::error::{DubError, RecognitionFailure, RecognizeError};
use crate::media::MediaToolkit;
use crate::services::{LipSyncRenderer, SpeechRecognizer, SpeechSynthesizer};

/// Tagged outcome of one pipeline stage.
///
/// `Empty` means the stage completed but produced no usable content; the
/// orchestrator maps it to an informational terminal state rather than a
/// failure.
#[derive(Debug)]
pub enum StageResult<T> {
    Ok(T),
    Empty,
    Failed(DubError),
}

/// Transcription stage settings.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Window length in seconds for each recognition call.
    pub window_seconds: f64,
    /// Language hint for the first attempt on each window.
    pub language_hint: Option<String>,
}

/// Transcribe an extracted audio file window by window.
///
/// Each window is sliced out and recognized with a two-tier retry: first with
/// the configured language hint, then once without it when the service rejects
/// the hinted request format. A window with no recognizable speech contributes
/// nothing and processing continues; only a service-level error aborts the
/// stage. If no window contributes text the result is `Empty`.
pub async fn transcribe(
    media: &dyn MediaToolkit,
    recognizer: &dyn SpeechRecognizer,
    audio: &Path,
    scratch: &Path,
    opts: &TranscribeOptions,
) -> StageResult<String> {
    let duration = match media.probe_duration(audio).await {
        Ok(d) => d,
        Err(e) => return StageResult::Failed(e),
    };

    let plan = WindowPlan::new(duration, opts.window_seconds);
    info!(
        "🎤 Transcribing {:.1}s of audio in {} windows",
        duration,
        plan.window_count()
    );

    let mut parts: Vec<String> = Vec::new();

    for window in plan.windows() {
        let window_path = scratch.join(format!("window_{:03}.wav", window.index));
        if let Err(e) = media
            .slice_audio(audio, window.offset, window.duration, &window_path)
            .await
        {
            return StageResult::Failed(e);
        }

        let recognized =
            match recognize_window(recognizer, &window_path, opts.language_hint.as_deref()).await {
                Ok(text) => text,
                Err(e) => {
                    let _ = tokio::fs::remove_file(&window_path).await;
                    return StageResult::Failed(e);
                }
            };

        // Window slices are ephemeral; drop each one as soon as it has been
        // recognized.
        let _ = tokio::fs::remove_file(&window_path).await;

        match recognized {
            Some(text) => {
                debug!("Window {} recognized {} characters", window.index, text.len());
                parts.push(text);
            }
            None => {
                warn!(
                    "Could not understand audio in window at offset {:.0}s",
                    window.offset
                );
            }
        }
    }

    if parts.is_empty() {
        info!("🔇 No speech detected in any window");
        return StageResult::Empty;
    }

    StageResult::Ok(parts.join(" "))
}

/// Recognize one window. `Ok(None)` means the window contributes no text.
async fn recognize_window(
    recognizer: &dyn SpeechRecognizer,
    window: &Path,
    language_hint: Option<&str>,
) -> Result<Option<String>, DubError> {
    match recognizer.recognize(window, language_hint).await {
        Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
        Ok(_) | Err(RecognizeError::NoSpeech) => Ok(None),
        Err(RecognizeError::InvalidRequest(detail)) if language_hint.is_some() => {
            // The service sometimes rejects hinted requests it would accept
            // unhinted; retry once without the hint before giving up on the
            // window.
            debug!("Hinted request rejected ({detail}); retrying without hint");
            match recognizer.recognize(window, None).await {
                Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
                Ok(_) | Err(_) => Ok(None),
            }
        }
        Err(RecognizeError::InvalidRequest(_)) => Ok(None),
        Err(RecognizeError::Unintelligible) => {
            Err(DubError::Recognition(RecognitionFailure::NotUnderstood))
        }
        Err(RecognizeError::Service(detail)) => Err(DubError::Recognition(
            RecognitionFailure::ServiceUnavailable(detail),
        )),
    }
}

/// Synthesize translated text into one combined audio artifact.
///
/// The text is split into byte-bounded chunks, each chunk synthesized to its
/// own segment, and the segments concatenated in chunk order. A single chunk
/// skips the concatenation step. Per-chunk segments are deleted once combined.
pub async fn synthesize(
    media: &dyn MediaToolkit,
    synthesizer: &dyn SpeechSynthesizer,
    text: &str,
    language: &str,
    scratch: &Path,
    max_chunk_bytes: usize,
) -> StageResult<PathBuf> {
    let chunks = split_text(text, max_chunk_bytes);
    if chunks.is_empty() {
        return StageResult::Empty;
    }

    info!("🗣️ Synthesizing {} text chunk(s)", chunks.len());

    let mut segments: Vec<PathBuf> = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let segment = scratch.join(format!("synth_{i:03}.wav"));
        debug!("Synthesizing chunk {}/{}", i + 1, chunks.len());
        if let Err(e) = synthesizer.synthesize(chunk, language, &segment).await {
            return StageResult::Failed(e);
        }
        segments.push(segment);
    }

    if segments.len() == 1 {
        return StageResult::Ok(segments.into_iter().next().unwrap());
    }

    let combined = scratch.join("synth_combined.wav");
    if let Err(e) = media.concat_audio(&segments, &combined).await {
        return StageResult::Failed(e);
    }

    for segment in &segments {
        if let Err(e) = tokio::fs::remove_file(segment).await {
            warn!("Failed to remove segment {}: {}", segment.display(), e);
        }
    }

    StageResult::Ok(combined)
}

/// Assemble the output video: lip-sync first, plain re-mux as fallback.
///
/// The fallback clamps the dubbed audio to the video's duration (longer audio
/// is truncated, shorter audio leaves the trailing video untouched) and never
/// leaves a partial output behind on failure.
pub async fn assemble(
    media: &dyn MediaToolkit,
    lip_sync: &dyn LipSyncRenderer,
    video: &Path,
    audio: &Path,
    out: &Path,
    scratch: &Path,
) -> StageResult<PathBuf> {
    match lip_sync.render(video, audio, out).await {
        Ok(()) => {
            info!("✅ Lip-sync assembly succeeded: {}", out.display());
            return StageResult::Ok(out.to_path_buf());
        }
        Err(e) => {
            warn!("Lip-sync failed, falling back to re-mux: {}", e.detail());
        }
    }

    match remux_fallback(media, video, audio, out, scratch).await {
        Ok(()) => StageResult::Ok(out.to_path_buf()),
        Err(e) => {
            // A partial container is worse than none.
            let _ = tokio::fs::remove_file(out).await;
            StageResult::Failed(DubError::Assembly(format!(
                "lip-sync and re-mux both failed: {}",
                e.detail()
            )))
        }
    }
}

async fn remux_fallback(
    media: &dyn MediaToolkit,
    video: &Path,
    audio: &Path,
    out: &Path,
    scratch: &Path,
) -> Result<(), DubError> {
    let video_duration = media.probe_duration(video).await?;
    let audio_duration = media.probe_duration(audio).await?;

    let mux_audio = if audio_duration > video_duration {
        debug!(
            "Trimming dubbed audio from {:.1}s to video length {:.1}s",
            audio_duration, video_duration
        );
        let trimmed = scratch.join("synth_trimmed.wav");
        media.trim_audio(audio, video_duration, &trimmed).await?;
        trimmed
    } else {
        audio.to_path_buf()
    };

    media.replace_audio(video, &mux_audio, out).await
}
