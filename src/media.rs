use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{DubError, Result};

/// Container/codec boundary for the pipeline.
///
/// All video and audio manipulation goes through this trait so the
/// orchestrator and stage adapters can be exercised with fakes in tests.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Decode the video's audio track to mono 16-bit PCM WAV at the given
    /// sample rate, suitable for transcription.
    async fn extract_audio(&self, video: &Path, audio_out: &Path, sample_rate: u32) -> Result<()>;

    /// Total duration of a media file in seconds.
    async fn probe_duration(&self, media: &Path) -> Result<f64>;

    /// Copy one window `[offset, offset+duration)` of an audio file into a
    /// standalone file.
    async fn slice_audio(&self, audio: &Path, offset: f64, duration: f64, out: &Path)
        -> Result<()>;

    /// Concatenate WAV segments, in order, into one file.
    async fn concat_audio(&self, segments: &[PathBuf], out: &Path) -> Result<()>;

    /// Copy audio truncated to `max_seconds`.
    async fn trim_audio(&self, audio: &Path, max_seconds: f64, out: &Path) -> Result<()>;

    /// Write a new container with the original video stream and the given
    /// audio as its only audio stream. The video stream is not re-encoded.
    async fn replace_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<()>;
}

/// FFmpeg-backed implementation of [`MediaToolkit`].
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolkit;

impl FfmpegToolkit {
    pub fn new() -> Self {
        Self
    }

    async fn run_ffmpeg(&self, args: &[&str], context: &str) -> Result<()> {
        debug!("ffmpeg {}", args.join(" "));
        let output = Command::new("ffmpeg")
            .args(args)
            .output()
            .await
            .map_err(|e| DubError::Decode(format!("failed to launch ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Decode(format!(
                "{context}: ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn extract_audio(&self, video: &Path, audio_out: &Path, sample_rate: u32) -> Result<()> {
        info!("🎵 Extracting audio: {}", video.display());
        let sample_rate = sample_rate.to_string();
        self.run_ffmpeg(
            &[
                "-i",
                path_str(video)?,
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                &sample_rate,
                "-ac",
                "1",
                "-f",
                "wav",
                "-y",
                path_str(audio_out)?,
            ],
            "audio extraction",
        )
        .await
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                path_str(media)?,
            ])
            .output()
            .await
            .map_err(|e| DubError::Decode(format!("failed to launch ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(DubError::Decode(format!(
                "ffprobe failed for {}",
                media.display()
            )));
        }

        let data: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| DubError::Decode(format!("unparseable ffprobe output: {e}")))?;

        data["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| DubError::Decode(format!("no duration in probe of {}", media.display())))
    }

    async fn slice_audio(
        &self,
        audio: &Path,
        offset: f64,
        duration: f64,
        out: &Path,
    ) -> Result<()> {
        self.run_ffmpeg(
            &[
                "-i",
                path_str(audio)?,
                "-ss",
                &format!("{offset:.3}"),
                "-t",
                &format!("{duration:.3}"),
                "-c",
                "copy",
                "-y",
                path_str(out)?,
            ],
            "audio window slice",
        )
        .await
    }

    async fn concat_audio(&self, segments: &[PathBuf], out: &Path) -> Result<()> {
        info!("🔗 Concatenating {} audio segments", segments.len());
        // concat demuxer needs a list file; segments share codec parameters
        // so stream copy is safe.
        let list_path = out.with_extension("txt");
        let mut list = String::new();
        for segment in segments {
            list.push_str(&format!("file '{}'\n", path_str(segment)?.replace('\'', "'\\''")));
        }
        tokio::fs::write(&list_path, list).await?;

        let result = self
            .run_ffmpeg(
                &[
                    "-f",
                    "concat",
                    "-safe",
                    "0",
                    "-i",
                    path_str(&list_path)?,
                    "-c",
                    "copy",
                    "-y",
                    path_str(out)?,
                ],
                "audio concatenation",
            )
            .await;

        let _ = tokio::fs::remove_file(&list_path).await;
        result
    }

    async fn trim_audio(&self, audio: &Path, max_seconds: f64, out: &Path) -> Result<()> {
        self.run_ffmpeg(
            &[
                "-i",
                path_str(audio)?,
                "-t",
                &format!("{max_seconds:.3}"),
                "-c",
                "copy",
                "-y",
                path_str(out)?,
            ],
            "audio trim",
        )
        .await
    }

    async fn replace_audio(&self, video: &Path, audio: &Path, out: &Path) -> Result<()> {
        info!("🎬 Muxing replaced audio into {}", out.display());
        self.run_ffmpeg(
            &[
                "-i",
                path_str(video)?,
                "-i",
                path_str(audio)?,
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                "aac",
                "-y",
                path_str(out)?,
            ],
            "audio replacement mux",
        )
        .await?;

        // Never hand back a silently corrupt container.
        let meta = tokio::fs::metadata(out).await?;
        if meta.len() == 0 {
            return Err(DubError::Decode(format!(
                "mux produced empty output at {}",
                out.display()
            )));
        }
        Ok(())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| DubError::Decode(format!("non-UTF-8 path: {}", path.display())))
}
