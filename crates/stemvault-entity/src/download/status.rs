//! Download tracking-record status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an eager archive assembly tracked by a [`super::Download`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// Created, waiting for a worker.
    Pending,
    /// A worker is assembling the archive.
    Processing,
    /// The archive is attached and ready to fetch.
    Ready,
    /// Assembly failed; see the record's error message.
    Failed,
    /// Fetched or dismissed by the caller.
    Downloaded,
}

impl DownloadStatus {
    /// Check whether the record still represents live or pending work.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Ready)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Downloaded => "downloaded",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
