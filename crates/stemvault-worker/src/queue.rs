//! In-memory task queue backing the worker runner.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use stemvault_core::error::AppError;
use stemvault_core::result::AppResult;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::JobId;
use stemvault_entity::job::{Job, JobStatus};

/// In-memory task queue: a channel feeding the worker runner, plus a
/// record per job so callers can observe status after the fact.
#[derive(Debug)]
pub struct InMemoryTaskQueue {
    records: DashMap<JobId, Job>,
    sender: mpsc::UnboundedSender<Job>,
}

impl InMemoryTaskQueue {
    /// Create a queue and the receiving end for a [`WorkerRunner`].
    ///
    /// [`WorkerRunner`]: crate::runner::WorkerRunner
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<Job>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                records: DashMap::new(),
                sender,
            }),
            receiver,
        )
    }

    /// Fetch a job record.
    pub fn get(&self, id: JobId) -> Option<Job> {
        self.records.get(&id).map(|job| job.clone())
    }

    /// Number of job records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Mark a job as running.
    pub fn mark_running(&self, id: JobId) {
        if let Some(mut job) = self.records.get_mut(&id) {
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
        }
    }

    /// Mark a job as completed.
    pub fn mark_completed(&self, id: JobId) {
        if let Some(mut job) = self.records.get_mut(&id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
        }
    }

    /// Mark a job as failed with a reason.
    pub fn mark_failed(&self, id: JobId, message: &str) {
        if let Some(mut job) = self.records.get_mut(&id) {
            job.status = JobStatus::Failed;
            job.error_message = Some(message.to_string());
            job.completed_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, kind: &str, payload: serde_json::Value) -> AppResult<JobId> {
        let job = Job::new(kind, payload);
        let id = job.id;
        self.records.insert(id, job.clone());
        self.sender
            .send(job)
            .map_err(|_| AppError::internal("Worker channel is closed"))?;
        debug!(job = %id, kind, "Enqueued job");
        Ok(id)
    }
}
