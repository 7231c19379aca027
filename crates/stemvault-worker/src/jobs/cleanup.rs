//! Download cleanup job handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use stemvault_entity::job::Job;
use stemvault_service::DownloadService;

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `download_cleanup` jobs: sweeps stale download records and
/// releases their archive blobs.
#[derive(Debug)]
pub struct DownloadCleanupJobHandler {
    downloads: Arc<DownloadService>,
}

impl DownloadCleanupJobHandler {
    /// Create a new download cleanup job handler.
    pub fn new(downloads: Arc<DownloadService>) -> Self {
        Self { downloads }
    }
}

#[async_trait]
impl JobHandler for DownloadCleanupJobHandler {
    fn job_type(&self) -> &str {
        "download_cleanup"
    }

    async fn execute(&self, _job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let removed = self
            .downloads
            .sweep()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Download sweep failed: {e}")))?;
        info!(removed, "Download cleanup finished");
        Ok(Some(serde_json::json!({ "removed": removed })))
    }
}
