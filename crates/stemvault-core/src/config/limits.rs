//! Size ceilings for extraction and assembly.
//!
//! All limits are checked before any work starts; a rejected operation
//! reports the configured limit in the error message.

use serde::{Deserialize, Serialize};

/// Archive and tree size ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of entries an uploaded archive may contain.
    #[serde(default = "default_max_archive_entries")]
    pub max_archive_entries: usize,
    /// Maximum total uncompressed size of an uploaded archive, in bytes.
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
    /// Maximum number of files an assembled archive may contain.
    #[serde(default = "default_max_assembly_files")]
    pub max_assembly_files: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_archive_entries: default_max_archive_entries(),
            max_archive_bytes: default_max_archive_bytes(),
            max_assembly_files: default_max_assembly_files(),
        }
    }
}

fn default_max_archive_entries() -> usize {
    10_000
}

fn default_max_archive_bytes() -> u64 {
    10_737_418_240 // 10 GB uncompressed
}

fn default_max_assembly_files() -> u64 {
    10_000
}
