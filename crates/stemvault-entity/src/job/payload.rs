//! Typed job payload definitions.

use serde::{Deserialize, Serialize};

use stemvault_core::types::{AssetId, DownloadId, OwnerId};

/// Typed payloads for known job types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum JobPayload {
    /// Unpack an uploaded archive into a subtree of asset nodes.
    #[serde(rename = "archive_extraction")]
    ArchiveExtraction {
        /// The root node carrying the archive blob.
        asset_id: AssetId,
        /// The owner of the tree.
        owner_id: OwnerId,
    },
    /// Assemble a subtree into an archive behind a tracking record.
    #[serde(rename = "archive_assembly")]
    ArchiveAssembly {
        /// The tracking record to report progress on.
        download_id: DownloadId,
    },
    /// Deep-clone a subtree into another owner's tree.
    #[serde(rename = "clone_to_owner")]
    CloneToOwner {
        /// The source subtree root.
        source_id: AssetId,
        /// The owner of the source tree.
        source_owner_id: OwnerId,
        /// The placeholder root already created in the new owner's tree.
        placeholder_id: AssetId,
        /// The owner receiving the clone.
        new_owner_id: OwnerId,
    },
    /// Repopulate a duplicated root's children from the source subtree,
    /// re-attaching content blobs by reference.
    #[serde(rename = "populate_copy")]
    PopulateCopy {
        /// The source subtree root.
        source_id: AssetId,
        /// The freshly duplicated root to populate.
        copy_id: AssetId,
        /// The owner of both trees.
        owner_id: OwnerId,
    },
    /// Reclaim stale download tracking records and their archive blobs.
    #[serde(rename = "download_cleanup")]
    DownloadCleanup,
}

impl JobPayload {
    /// The job-type tag used for queueing and handler dispatch.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArchiveExtraction { .. } => "archive_extraction",
            Self::ArchiveAssembly { .. } => "archive_assembly",
            Self::CloneToOwner { .. } => "clone_to_owner",
            Self::PopulateCopy { .. } => "populate_copy",
            Self::DownloadCleanup => "download_cleanup",
        }
    }
}
