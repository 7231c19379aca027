//! Archive extraction job handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use stemvault_entity::job::{Job, JobPayload};
use stemvault_service::ExtractionService;

use crate::executor::{JobExecutionError, JobHandler};
use crate::jobs::parse_payload;

/// Handles `archive_extraction` jobs.
#[derive(Debug)]
pub struct ExtractionJobHandler {
    extraction: Arc<ExtractionService>,
}

impl ExtractionJobHandler {
    /// Create a new extraction job handler.
    pub fn new(extraction: Arc<ExtractionService>) -> Self {
        Self { extraction }
    }
}

#[async_trait]
impl JobHandler for ExtractionJobHandler {
    fn job_type(&self) -> &str {
        "archive_extraction"
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let JobPayload::ArchiveExtraction { asset_id, .. } = parse_payload(job)? else {
            return Err(JobExecutionError::Permanent(format!(
                "Unexpected payload for job type '{}'",
                job.job_type
            )));
        };

        self.extraction.extract(asset_id).await?;
        Ok(Some(serde_json::json!({ "asset_id": asset_id })))
    }
}
