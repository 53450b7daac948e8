use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::LipSyncRenderer;
use crate::config::LipSyncConfig;
use crate::error::{DubError, Result};

/// Wav2Lip inference invoked as a subprocess.
///
/// Any failure here (missing checkpoint, no detectable face, crashed
/// inference) is reported as an error and handled by the assembly stage's
/// re-mux fallback.
pub struct Wav2LipRenderer {
    config: LipSyncConfig,
}

impl Wav2LipRenderer {
    pub fn new(config: LipSyncConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LipSyncRenderer for Wav2LipRenderer {
    async fn render(&self, video: &Path, audio: &Path, out: &Path) -> Result<()> {
        if !self.config.enabled {
            return Err(DubError::Assembly("lip-sync disabled by config".to_string()));
        }
        if !self.config.script_path.exists() || !self.config.checkpoint_path.exists() {
            return Err(DubError::Assembly(
                "Wav2Lip script or checkpoint not found".to_string(),
            ));
        }

        info!("👄 Running lip-sync inference for {}", video.display());
        debug!(
            "wav2lip: script={} checkpoint={}",
            self.config.script_path.display(),
            self.config.checkpoint_path.display()
        );

        let output = Command::new(&self.config.python)
            .arg(&self.config.script_path)
            .arg("--checkpoint_path")
            .arg(&self.config.checkpoint_path)
            .arg("--face")
            .arg(video)
            .arg("--audio")
            .arg(audio)
            .arg("--outfile")
            .arg(out)
            .output()
            .await
            .map_err(|e| DubError::Assembly(format!("failed to launch inference: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Assembly(format!(
                "inference exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let meta = tokio::fs::metadata(out).await?;
        if meta.len() == 0 {
            return Err(DubError::Assembly(
                "lip-sync produced an empty output file".to_string(),
            ));
        }

        Ok(())
    }
}
