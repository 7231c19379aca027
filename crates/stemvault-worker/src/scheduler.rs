//! Periodic maintenance scheduling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use stemvault_core::traits::queue::TaskQueue;
use stemvault_entity::job::JobPayload;

use crate::queue::InMemoryTaskQueue;

/// Enqueue a `download_cleanup` job on a fixed interval until cancelled.
///
/// The first tick fires after one full interval, not at startup.
pub fn spawn_download_sweeper(
    queue: Arc<InMemoryTaskQueue>,
    interval_seconds: u64,
    mut cancel: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        interval.tick().await; // consume the immediate first tick
        info!(interval_seconds, "Download sweeper started");

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Download sweeper stopped");
                        return;
                    }
                }
                _ = interval.tick() => {
                    let payload = JobPayload::DownloadCleanup;
                    let value = match serde_json::to_value(&payload) {
                        Ok(value) => value,
                        Err(e) => {
                            error!(error = %e, "Failed to serialize cleanup payload");
                            continue;
                        }
                    };
                    if let Err(e) = queue.enqueue(payload.kind(), value).await {
                        error!(error = %e, "Failed to enqueue download cleanup");
                    }
                }
            }
        }
    })
}
