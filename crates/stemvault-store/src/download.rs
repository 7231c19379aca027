//! Download tracking-record arena.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use stemvault_core::error::AppError;
use stemvault_core::result::AppResult;
use stemvault_core::types::{DownloadId, OwnerId};
use stemvault_entity::download::Download;

/// Id-keyed arena of download tracking records.
#[derive(Debug, Default)]
pub struct DownloadStore {
    /// All records, keyed by id.
    records: DashMap<DownloadId, Download>,
}

impl DownloadStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Insert a new record and return it.
    pub fn insert(&self, download: Download) -> Download {
        self.records.insert(download.id, download.clone());
        download
    }

    /// Fetch a record scoped to its owner.
    pub fn get(&self, id: DownloadId, owner: OwnerId) -> AppResult<Download> {
        self.records
            .get(&id)
            .filter(|record| record.owner_id == owner)
            .map(|record| record.clone())
            .ok_or_else(|| AppError::not_found("Download no longer exists"))
    }

    /// Fetch a record without owner scoping, for the assembly worker.
    pub fn get_unscoped(&self, id: DownloadId) -> AppResult<Download> {
        self.records
            .get(&id)
            .map(|record| record.clone())
            .ok_or_else(|| AppError::not_found("Download no longer exists"))
    }

    /// Apply a closure to a record and return the updated copy.
    pub fn update<F>(&self, id: DownloadId, f: F) -> AppResult<Download>
    where
        F: FnOnce(&mut Download),
    {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Download no longer exists"))?;
        f(entry.value_mut());
        entry.value_mut().updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// The owner's most recent record that still represents live work.
    pub fn active(&self, owner: OwnerId) -> Option<Download> {
        self.records
            .iter()
            .filter(|record| record.owner_id == owner && record.is_active())
            .map(|record| record.clone())
            .max_by_key(|record| record.created_at)
    }

    /// Records created before the cutoff, regardless of status.
    pub fn stale(&self, cutoff: DateTime<Utc>) -> Vec<Download> {
        self.records
            .iter()
            .filter(|record| record.created_at < cutoff)
            .map(|record| record.clone())
            .collect()
    }

    /// Remove a record, returning it if present.
    pub fn remove(&self, id: DownloadId) -> Option<Download> {
        self.records.remove(&id).map(|(_, record)| record)
    }

    /// Total number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }
}
