//! Download lifecycle: request, poll, fetch, dismiss, sweep.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use stemvault_core::config::downloads::DownloadsConfig;
use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::{BlobStore, ByteStream};
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::{AssetId, DownloadId, OwnerId};
use stemvault_core::AppError;
use stemvault_entity::download::{Download, DownloadStatus};
use stemvault_entity::job::JobPayload;
use stemvault_store::{AssetStore, DownloadStore};

/// The polling view of a download record.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadPoll {
    /// Record id.
    pub id: DownloadId,
    /// Current status.
    pub status: DownloadStatus,
    /// Entries written so far.
    pub progress: u64,
    /// Total entries to write.
    pub total: u64,
    /// Human-readable progress (`Preparing...` until the total is known).
    pub progress_text: String,
    /// The filename the archive will be served as.
    pub filename: String,
    /// Failure reason, if any.
    pub error_message: Option<String>,
}

impl From<&Download> for DownloadPoll {
    fn from(d: &Download) -> Self {
        Self {
            id: d.id,
            status: d.status,
            progress: d.progress,
            total: d.total,
            progress_text: d.progress_text(),
            filename: d.filename.clone(),
            error_message: d.error_message.clone(),
        }
    }
}

/// A ready archive opened for serving.
pub struct DownloadFile {
    /// The filename to serve as.
    pub filename: String,
    /// Content size in bytes.
    pub size_bytes: u64,
    /// The archive content.
    pub content: ByteStream,
}

/// Service managing download tracking records.
#[derive(Debug)]
pub struct DownloadService {
    downloads: Arc<DownloadStore>,
    assets: Arc<AssetStore>,
    blobs: Arc<dyn BlobStore>,
    queue: Arc<dyn TaskQueue>,
    retention: DownloadsConfig,
}

impl DownloadService {
    /// Create a new download service.
    pub fn new(
        downloads: Arc<DownloadStore>,
        assets: Arc<AssetStore>,
        blobs: Arc<dyn BlobStore>,
        queue: Arc<dyn TaskQueue>,
        retention: DownloadsConfig,
    ) -> Self {
        Self {
            downloads,
            assets,
            blobs,
            queue,
            retention,
        }
    }

    /// Request a download of an asset's subtree.
    ///
    /// Creates a pending tracking record and enqueues the assembly job;
    /// the caller polls the record until it is ready.
    pub async fn request(&self, owner: OwnerId, asset_id: AssetId) -> AppResult<Download> {
        let asset = self.assets.get(asset_id, owner)?;
        let record = self.downloads.insert(Download::new(
            owner,
            asset_id,
            asset.display_name().to_string(),
        ));

        let payload = JobPayload::ArchiveAssembly {
            download_id: record.id,
        };
        self.queue
            .enqueue(payload.kind(), serde_json::to_value(&payload)?)
            .await?;

        info!(download = %record.id, asset = %asset_id, "Requested download");
        Ok(record)
    }

    /// Poll one download record.
    pub fn status(&self, owner: OwnerId, id: DownloadId) -> AppResult<DownloadPoll> {
        let record = self.downloads.get(id, owner)?;
        Ok(DownloadPoll::from(&record))
    }

    /// The owner's most recent download that is still pending, building,
    /// or ready to fetch.
    pub fn active(&self, owner: OwnerId) -> Option<DownloadPoll> {
        self.downloads
            .active(owner)
            .map(|record| DownloadPoll::from(&record))
    }

    /// Open a ready download for serving and mark it fetched.
    ///
    /// Only `ready` records have a file; anything else reports `NotFound`
    /// so pollers keep polling.
    pub async fn take_file(&self, owner: OwnerId, id: DownloadId) -> AppResult<DownloadFile> {
        let record = self.downloads.get(id, owner)?;
        let blob = match (record.status, record.archive_blob) {
            (DownloadStatus::Ready, Some(blob)) => blob,
            _ => return Err(AppError::not_found("No file available for this download")),
        };

        let meta = self.blobs.metadata(&blob).await?;
        let content = self.blobs.read(&blob).await?;
        self.downloads
            .update(id, |d| d.status = DownloadStatus::Downloaded)?;

        Ok(DownloadFile {
            filename: record.filename,
            size_bytes: meta.size_bytes,
            content,
        })
    }

    /// Dismiss a download from the owner's view. An in-flight assembly
    /// keeps running; the record just stops being active.
    pub fn dismiss(&self, owner: OwnerId, id: DownloadId) -> AppResult<Download> {
        self.downloads.get(id, owner)?;
        self.downloads
            .update(id, |d| d.status = DownloadStatus::Downloaded)
    }

    /// Reclaim records older than the retention window, releasing their
    /// archive blobs. Returns the number of records removed.
    pub async fn sweep(&self) -> AppResult<usize> {
        let cutoff = Utc::now() - Duration::hours(self.retention.retention_hours as i64);
        let stale = self.downloads.stale(cutoff);
        let count = stale.len();

        for record in stale {
            if let Some(blob) = &record.archive_blob {
                if let Err(err) = self.blobs.release(blob).await {
                    warn!(download = %record.id, blob = %blob, error = %err, "Failed to release archive blob");
                }
            }
            self.downloads.remove(record.id);
        }

        if count > 0 {
            info!(removed = count, "Swept stale downloads");
        }
        Ok(count)
    }
}
