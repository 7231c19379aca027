//! Archive assembly job handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use stemvault_entity::job::{Job, JobPayload};
use stemvault_service::AssemblyService;

use crate::executor::{JobExecutionError, JobHandler};
use crate::jobs::parse_payload;

/// Handles `archive_assembly` jobs. The service marks the download record
/// failed itself; the job record mirrors the outcome.
#[derive(Debug)]
pub struct AssemblyJobHandler {
    assembly: Arc<AssemblyService>,
}

impl AssemblyJobHandler {
    /// Create a new assembly job handler.
    pub fn new(assembly: Arc<AssemblyService>) -> Self {
        Self { assembly }
    }
}

#[async_trait]
impl JobHandler for AssemblyJobHandler {
    fn job_type(&self) -> &str {
        "archive_assembly"
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let JobPayload::ArchiveAssembly { download_id } = parse_payload(job)? else {
            return Err(JobExecutionError::Permanent(format!(
                "Unexpected payload for job type '{}'",
                job.job_type
            )));
        };

        self.assembly.assemble(download_id).await?;
        Ok(Some(serde_json::json!({ "download_id": download_id })))
    }
}
