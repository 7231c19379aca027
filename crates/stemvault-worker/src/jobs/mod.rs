//! Built-in job handlers.

pub mod assembly;
pub mod cleanup;
pub mod clone;
pub mod extraction;

use stemvault_entity::job::{Job, JobPayload};

use crate::executor::JobExecutionError;

/// Parse a job's payload into its typed form.
pub(crate) fn parse_payload(job: &Job) -> Result<JobPayload, JobExecutionError> {
    serde_json::from_value(job.payload.clone())
        .map_err(|e| JobExecutionError::Permanent(format!("Invalid job payload: {e}")))
}
