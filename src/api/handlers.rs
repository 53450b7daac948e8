use anyhow::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::job::{JobOrchestrator, JobSource};
use crate::registry::{JobRegistry, JobStatus};

/// Persist an uploaded video under a job-unique name and submit the job.
///
/// The unique prefix prevents two concurrent jobs uploading the same filename
/// from clobbering each other.
pub async fn submit_upload(
    registry: &Arc<JobRegistry>,
    orchestrator: Arc<JobOrchestrator>,
    uploads_dir: &Path,
    filename: &str,
    bytes: &[u8],
    target_language: String,
) -> Result<Value> {
    tokio::fs::create_dir_all(uploads_dir).await?;

    let safe_name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.mp4".to_string());
    let stored = uploads_dir.join(format!("{}_{}", uuid::Uuid::new_v4(), safe_name));
    tokio::fs::write(&stored, bytes).await?;

    info!("💾 Stored upload at {}", stored.display());

    let task_id = registry
        .submit(orchestrator, JobSource::Upload(stored), target_language)
        .await;

    Ok(json!({ "task_id": task_id, "status": "processing" }))
}

/// Submit a remote-URL job.
pub async fn submit_url(
    registry: &Arc<JobRegistry>,
    orchestrator: Arc<JobOrchestrator>,
    url: String,
    target_language: String,
) -> Result<Value> {
    let task_id = registry
        .submit(orchestrator, JobSource::Url(url), target_language)
        .await;

    Ok(json!({ "task_id": task_id, "status": "processing" }))
}

/// Status poll response, or `None` for an unknown job id.
pub async fn job_status(registry: &JobRegistry, job_id: &str) -> Option<Value> {
    let status = registry.status(job_id).await?;
    Some(match status {
        JobStatus::Pending => json!({
            "state": "PENDING",
            "status": "Task is pending...",
        }),
        JobStatus::Running { status } => json!({
            "state": "PROGRESS",
            "status": status,
        }),
        JobStatus::Succeeded { video_path } => json!({
            "state": "SUCCESS",
            "result": { "status": "success", "video_path": video_path },
        }),
        JobStatus::Info { message } => json!({
            "state": "SUCCESS",
            "result": { "status": "info", "message": message },
        }),
        JobStatus::Failed { message } => json!({
            "state": "FAILURE",
            "error": message,
        }),
    })
}

/// Outcome of an artifact retrieval request.
#[derive(Debug)]
pub enum Download {
    /// The output exists and these are its bytes.
    Ready(Vec<u8>),
    /// No output for this id (never produced, or already deleted).
    NotFound,
    /// A file exists but is zero-length: corrupted, not missing.
    Corrupted,
}

/// Fetch a completed job's output video from durable storage.
pub async fn download(output_dir: &Path, job_id: &str) -> Result<Download> {
    let path: PathBuf = output_dir.join(format!("{job_id}.mp4"));

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Download::NotFound),
        Err(e) => return Err(e.into()),
    };

    if meta.len() == 0 {
        return Ok(Download::Corrupted);
    }

    Ok(Download::Ready(tokio::fs::read(&path).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn status_of_unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(job_status(&registry, "missing").await.is_none());
    }

    #[tokio::test]
    async fn pending_and_failed_statuses_map_to_envelope() {
        let registry = JobRegistry::new();
        registry.set_status("a", JobStatus::Pending).await;
        registry
            .set_status(
                "b",
                JobStatus::Failed {
                    message: "Cannot process private videos".to_string(),
                },
            )
            .await;

        let pending = job_status(&registry, "a").await.unwrap();
        assert_eq!(pending["state"], "PENDING");

        let failed = job_status(&registry, "b").await.unwrap();
        assert_eq!(failed["state"], "FAILURE");
        assert_eq!(failed["error"], "Cannot process private videos");
    }

    #[tokio::test]
    async fn download_distinguishes_missing_from_corrupted() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            download(dir.path(), "none").await.unwrap(),
            Download::NotFound
        ));

        tokio::fs::write(dir.path().join("empty.mp4"), b"")
            .await
            .unwrap();
        assert!(matches!(
            download(dir.path(), "empty").await.unwrap(),
            Download::Corrupted
        ));

        tokio::fs::write(dir.path().join("ok.mp4"), b"video")
            .await
            .unwrap();
        match download(dir.path(), "ok").await.unwrap() {
            Download::Ready(bytes) => assert_eq!(bytes, b"video"),
            other => panic!("expected ready, got {other:?}"),
        }
    }
}
