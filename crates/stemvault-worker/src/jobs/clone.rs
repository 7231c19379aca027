//! Clone population job handlers.
//!
//! Both jobs funnel into the same subtree population: `populate_copy`
//! fills a same-owner duplicate, `clone_to_owner` fills a cross-owner
//! placeholder.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use stemvault_entity::job::{Job, JobPayload};
use stemvault_service::CloneService;

use crate::executor::{JobExecutionError, JobHandler};
use crate::jobs::parse_payload;

/// Handles `populate_copy` jobs.
#[derive(Debug)]
pub struct PopulateCopyJobHandler {
    clones: Arc<CloneService>,
}

impl PopulateCopyJobHandler {
    /// Create a new populate-copy job handler.
    pub fn new(clones: Arc<CloneService>) -> Self {
        Self { clones }
    }
}

#[async_trait]
impl JobHandler for PopulateCopyJobHandler {
    fn job_type(&self) -> &str {
        "populate_copy"
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let JobPayload::PopulateCopy {
            source_id, copy_id, ..
        } = parse_payload(job)?
        else {
            return Err(JobExecutionError::Permanent(format!(
                "Unexpected payload for job type '{}'",
                job.job_type
            )));
        };

        self.clones.populate(source_id, copy_id).await?;
        Ok(Some(serde_json::json!({ "copy_id": copy_id })))
    }
}

/// Handles `clone_to_owner` jobs.
#[derive(Debug)]
pub struct CloneToOwnerJobHandler {
    clones: Arc<CloneService>,
}

impl CloneToOwnerJobHandler {
    /// Create a new clone-to-owner job handler.
    pub fn new(clones: Arc<CloneService>) -> Self {
        Self { clones }
    }
}

#[async_trait]
impl JobHandler for CloneToOwnerJobHandler {
    fn job_type(&self) -> &str {
        "clone_to_owner"
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let JobPayload::CloneToOwner {
            source_id,
            placeholder_id,
            ..
        } = parse_payload(job)?
        else {
            return Err(JobExecutionError::Permanent(format!(
                "Unexpected payload for job type '{}'",
                job.job_type
            )));
        };

        self.clones.populate(source_id, placeholder_id).await?;
        Ok(Some(serde_json::json!({ "placeholder_id": placeholder_id })))
    }
}
