//! Download tracking-record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stemvault_core::types::{AssetId, BlobId, DownloadId, OwnerId};

use super::status::DownloadStatus;

/// A pollable record tracking one eager archive assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    /// Unique tracking-record identifier.
    pub id: DownloadId,
    /// The owner who requested the download.
    pub owner_id: OwnerId,
    /// The asset whose subtree is being assembled.
    pub asset_id: AssetId,
    /// The filename (without extension) the archive will be served as.
    pub filename: String,
    /// Current assembly status.
    pub status: DownloadStatus,
    /// Archive entries written so far.
    pub progress: u64,
    /// Total archive entries to write.
    pub total: u64,
    /// The completed archive blob (present once status is `Ready`).
    pub archive_blob: Option<BlobId>,
    /// Error message when status is `Failed`.
    pub error_message: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Download {
    /// Create a new pending tracking record.
    pub fn new(owner_id: OwnerId, asset_id: AssetId, filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DownloadId::new(),
            owner_id,
            asset_id,
            filename: filename.into(),
            status: DownloadStatus::Pending,
            progress: 0,
            total: 0,
            archive_blob: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable progress for the polling surface.
    pub fn progress_text(&self) -> String {
        if self.total == 0 {
            "Preparing...".to_string()
        } else {
            format!("{}/{}", self.progress, self.total)
        }
    }

    /// Check whether this record still represents live or pending work.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
