use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::{DubError, FetchError, FetchErrorKind, Result};

/// Acquires a remote video into a caller-owned scratch directory.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Download the video at `url` into `dest_dir` and return the local path.
    /// The caller owns `dest_dir` and is responsible for removing it once the
    /// file has been consumed.
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// yt-dlp-backed fetcher with source-specific failure classification.
pub struct YtDlpFetcher {
    config: FetchConfig,
}

impl YtDlpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    fn validate_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(FetchError::new(FetchErrorKind::InvalidUrl, "empty URL").into());
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| FetchError::new(FetchErrorKind::InvalidUrl, e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::new(
                FetchErrorKind::InvalidUrl,
                format!("unsupported scheme: {}", parsed.scheme()),
            )
            .into());
        }
        Ok(())
    }

    async fn run_ytdlp(&self, args: &[&str]) -> Result<std::process::Output> {
        debug!("yt-dlp {}", args.join(" "));
        Command::new("yt-dlp")
            .args(args)
            .output()
            .await
            .map_err(|e| {
                DubError::from(FetchError::new(
                    FetchErrorKind::Other,
                    format!("failed to launch yt-dlp: {e}"),
                ))
            })
    }

    /// Metadata-only probe: verifies the video is accessible before spending
    /// bandwidth on the download.
    async fn probe(&self, url: &str) -> Result<()> {
        let timeout = self.config.socket_timeout_seconds.to_string();
        let output = self
            .run_ytdlp(&[
                "--skip-download",
                "--no-warnings",
                "--socket-timeout",
                &timeout,
                "--print",
                "title",
                url,
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_download_error(&stderr).into());
        }

        let title = String::from_utf8_lossy(&output.stdout);
        info!("🔎 Found video: {}", title.trim());
        Ok(())
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        let timeout = self.config.socket_timeout_seconds.to_string();
        let retries = self.config.retries.to_string();
        let template = dest_dir.join("source.%(ext)s");
        let template = template
            .to_str()
            .ok_or_else(|| FetchError::new(FetchErrorKind::Other, "non-UTF-8 scratch path"))?;

        let output = self
            .run_ytdlp(&[
                "-f",
                &self.config.format,
                "-o",
                template,
                "--no-warnings",
                "--socket-timeout",
                &timeout,
                "--retries",
                &retries,
                url,
            ])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_download_error(&stderr).into());
        }

        // The extension depends on the chosen format; find the file we asked
        // yt-dlp to write.
        let mut entries = tokio::fs::read_dir(dest_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with("source."))
            {
                return Ok(path);
            }
        }

        Err(FetchError::new(
            FetchErrorKind::Other,
            "download reported success but no file was produced",
        )
        .into())
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        Self::validate_url(url)?;

        info!("⬇️ Fetching remote video: {}", url);
        self.probe(url).await?;

        let path = self.download(url, dest_dir).await?;
        info!("✅ Video downloaded to: {}", path.display());
        Ok(path)
    }
}

/// Classify a downloader error message into a user-facing category.
///
/// Keyed on substrings of yt-dlp's error text; these are not a stable
/// upstream contract and live in one place so they can be re-keyed to
/// documented error codes.
fn classify_download_error(message: &str) -> FetchError {
    let lowered = message.to_lowercase();
    let kind = if lowered.contains("copyright") {
        FetchErrorKind::Copyrighted
    } else if lowered.contains("private") {
        FetchErrorKind::Private
    } else if lowered.contains("not available") || lowered.contains("unavailable") {
        FetchErrorKind::Unavailable
    } else {
        FetchErrorKind::Other
    };
    FetchError::new(kind, message.trim().to_string())
}
