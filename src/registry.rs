use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::job::{JobOrchestrator, JobOutcome, JobSource, ProgressSink, Stage};

/// Externally visible job state, exactly what the status boundary reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, not yet picked up by a worker task.
    Pending,
    /// A stage is in flight; `status` is its human-readable label.
    Running { status: String },
    /// Terminal: the output video exists under the output directory.
    Succeeded { video_path: PathBuf },
    /// Terminal, informational: nothing to dub.
    Info { message: String },
    /// Terminal: user-facing failure reason.
    Failed { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded { .. } | JobStatus::Info { .. } | JobStatus::Failed { .. }
        )
    }
}

/// In-memory task-result store.
///
/// Holds one status per job id; jobs run on independent tokio tasks and only
/// touch the store through their own id, so concurrent jobs never interfere.
#[derive(Clone)]
pub struct JobRegistry {
    statuses: Arc<RwLock<HashMap<String, JobStatus>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Accept a job and dispatch it onto the async executor. Returns the
    /// opaque job id immediately; callers poll [`JobRegistry::status`].
    pub async fn submit(
        self: &Arc<Self>,
        orchestrator: Arc<JobOrchestrator>,
        source: JobSource,
        target_language: String,
    ) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.statuses
            .write()
            .await
            .insert(job_id.clone(), JobStatus::Pending);

        info!("📥 Accepted job {} ({:?})", job_id, source_kind(&source));

        let registry = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move {
            let outcome = orchestrator.run(&id, source, &target_language).await;
            registry.record_outcome(&id, outcome).await;
        });

        job_id
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.statuses.read().await.get(job_id).cloned()
    }

    async fn record_outcome(&self, job_id: &str, outcome: JobOutcome) {
        let status = match outcome {
            JobOutcome::Succeeded { output } => JobStatus::Succeeded { video_path: output },
            JobOutcome::NoSpeech { message } => JobStatus::Info { message },
            JobOutcome::Failed { message } => JobStatus::Failed { message },
        };
        self.statuses
            .write()
            .await
            .insert(job_id.to_string(), status);
    }

    #[cfg(test)]
    pub async fn set_status(&self, job_id: &str, status: JobStatus) {
        self.statuses
            .write()
            .await
            .insert(job_id.to_string(), status);
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for JobRegistry {
    async fn stage_started(&self, job_id: &str, stage: Stage) {
        debug!("Job {} entering stage: {}", job_id, stage.label());
        let mut statuses = self.statuses.write().await;
        // Terminal states are immutable; a late progress report must not
        // resurrect a finished job.
        match statuses.get(job_id) {
            Some(status) if status.is_terminal() => {}
            _ => {
                statuses.insert(
                    job_id.to_string(),
                    JobStatus::Running {
                        status: stage.label().to_string(),
                    },
                );
            }
        }
    }
}

fn source_kind(source: &JobSource) -> &'static str {
    match source {
        JobSource::Upload(_) => "upload",
        JobSource::Url(_) => "url",
    }
}
