//! Download tracking-record retention configuration.

use serde::{Deserialize, Serialize};

/// Retention settings for download tracking records and their archive blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Hours a tracking record (and its backing archive blob) is retained
    /// before the periodic sweep reclaims it.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    /// Seconds between sweep runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_retention_hours() -> u64 {
    24
}

fn default_sweep_interval() -> u64 {
    3600
}
