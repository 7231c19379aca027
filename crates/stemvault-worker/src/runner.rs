//! Worker runner: receives queued jobs and executes them concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{error, info, warn};

use stemvault_core::config::worker::WorkerConfig;
use stemvault_entity::job::Job;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::InMemoryTaskQueue;

/// Main worker loop. Jobs arrive over the queue's channel; a semaphore
/// caps how many run at once. On shutdown the runner stops accepting and
/// waits out in-flight jobs up to the configured grace period.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<InMemoryTaskQueue>,
    receiver: mpsc::UnboundedReceiver<Job>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        queue: Arc<InMemoryTaskQueue>,
        receiver: mpsc::UnboundedReceiver<Job>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            receiver,
            executor,
            config,
        }
    }

    /// Run until the cancel signal flips or the queue closes.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        info!(
            concurrency = self.config.concurrency,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Worker received shutdown signal");
                        break;
                    }
                }
                job = self.receiver.recv() => {
                    match job {
                        Some(job) => self.dispatch(job, &semaphore).await,
                        None => {
                            info!("Job channel closed, worker stopping");
                            break;
                        }
                    }
                }
            }
        }

        info!("Worker waiting for in-flight jobs to complete...");
        let grace = Duration::from_secs(self.config.shutdown_grace_seconds);
        let permits = self.config.concurrency as u32;
        if tokio::time::timeout(grace, semaphore.acquire_many(permits))
            .await
            .is_err()
        {
            warn!("Shutdown grace period elapsed with jobs still running");
        }
        info!("Worker shut down");
    }

    /// Wait for a slot, then execute the job on its own task.
    async fn dispatch(&self, job: Job, semaphore: &Arc<Semaphore>) {
        let Ok(permit) = Arc::clone(semaphore).acquire_owned().await else {
            return;
        };

        let queue = Arc::clone(&self.queue);
        let executor = Arc::clone(&self.executor);
        queue.mark_running(job.id);

        tokio::spawn(async move {
            let _permit = permit;
            let job_id = job.id;
            info!(job = %job_id, job_type = %job.job_type, "Processing job");

            match executor.execute(&job).await {
                Ok(_) => {
                    queue.mark_completed(job_id);
                    info!(job = %job_id, "Job completed");
                }
                Err(JobExecutionError::Transient(msg)) => {
                    warn!(job = %job_id, error = %msg, "Job failed (transient)");
                    queue.mark_failed(job_id, &msg);
                }
                Err(JobExecutionError::Permanent(msg)) => {
                    error!(job = %job_id, error = %msg, "Job failed permanently");
                    queue.mark_failed(job_id, &msg);
                }
                Err(JobExecutionError::Internal(err)) => {
                    let msg = err.to_string();
                    error!(job = %job_id, error = %msg, "Job internal error");
                    queue.mark_failed(job_id, &msg);
                }
            }
        });
    }
}
