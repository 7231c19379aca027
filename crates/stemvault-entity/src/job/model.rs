//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stemvault_core::types::JobId;

use super::status::JobStatus;

/// A background job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Job type identifier (e.g., `"archive_extraction"`).
    pub job_type: String,
    /// Job-specific payload (JSON).
    pub payload: serde_json::Value,
    /// Error message on failure.
    pub error_message: Option<String>,
    /// Current job status.
    pub status: JobStatus,
    /// When the job started executing.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: JobId::new(),
            job_type: job_type.into(),
            payload,
            error_message: None,
            status: JobStatus::Pending,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }
}
