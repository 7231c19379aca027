//! Archive extraction: unpack an uploaded zip into a subtree of nodes.
//!
//! The run claims the root's processing slot up front, so two extractions
//! of the same asset can never interleave. Progress is persisted after
//! every visible file, and the root flips to a directory only at the very
//! end, once the whole subtree exists.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use zip::ZipArchive;

use stemvault_core::config::limits::LimitsConfig;
use stemvault_core::error::ErrorKind;
use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::types::AssetId;
use stemvault_core::AppError;
use stemvault_entity::asset::kind::content_type_for;
use stemvault_entity::asset::{should_hide, Asset, ProcessingStatus};
use stemvault_store::AssetStore;

use crate::asset::classify::classify_subtree;

/// Metadata for one archive entry, collected in the sizing pre-pass.
#[derive(Debug)]
struct EntryInfo {
    index: usize,
    name: String,
    is_dir: bool,
    size: u64,
}

/// Service that unpacks uploaded archives into asset subtrees.
#[derive(Debug)]
pub struct ExtractionService {
    store: Arc<AssetStore>,
    blobs: Arc<dyn BlobStore>,
    limits: LimitsConfig,
}

impl ExtractionService {
    /// Create a new extraction service.
    pub fn new(store: Arc<AssetStore>, blobs: Arc<dyn BlobStore>, limits: LimitsConfig) -> Self {
        Self {
            store,
            blobs,
            limits,
        }
    }

    /// Extract the archive attached to `asset_id` into child nodes.
    ///
    /// Fails with `Conflict` if the asset is already extracted or another
    /// job holds its processing slot, and with `CapacityExceeded` before
    /// creating anything if the archive oversteps the configured limits.
    /// A failure mid-run leaves the slot claimed: a permanently
    /// `extracting` node is the visible signal of a crashed extraction.
    pub async fn extract(&self, asset_id: AssetId) -> AppResult<()> {
        let root = self.store.get_unscoped(asset_id)?;
        if root.extracted {
            return Err(AppError::conflict("Archive is already extracted"));
        }
        let blob_id = root
            .blob
            .ok_or_else(|| AppError::extraction("Asset has no content to extract"))?;

        self.store
            .try_claim_processing(asset_id, ProcessingStatus::Extracting)?;

        let data = match self.blobs.get(&blob_id).await {
            Ok(data) => data,
            Err(err) => {
                self.store.clear_processing(asset_id).ok();
                return Err(err);
            }
        };

        let mut archive = match ZipArchive::new(Cursor::new(data)) {
            Ok(archive) => archive,
            Err(err) => {
                self.store.clear_processing(asset_id).ok();
                return Err(AppError::with_source(
                    ErrorKind::Extraction,
                    "Failed to open archive",
                    err,
                ));
            }
        };

        let entries = match self.scan(&mut archive) {
            Ok(entries) => entries,
            Err(err) => {
                // Limit violations reject cleanly, before any node exists.
                self.store.clear_processing(asset_id).ok();
                return Err(err);
            }
        };

        let total = entries
            .iter()
            .filter(|e| !e.is_dir && !entry_hidden(&e.name))
            .count() as u64;
        self.store.set_processing_total(asset_id, total)?;
        info!(asset = %asset_id, entries = entries.len(), visible_files = total, "Extracting archive");

        self.materialize(&mut archive, &entries, &root).await?;

        self.store.update(asset_id, |node| {
            node.is_directory = true;
            node.extracted = true;
        })?;
        classify_subtree(&self.store, asset_id)?;
        self.store.clear_processing(asset_id)?;

        info!(asset = %asset_id, "Extraction complete");
        Ok(())
    }

    /// Size the archive against the configured limits and collect entry
    /// metadata for the materializing pass.
    fn scan(&self, archive: &mut ZipArchive<Cursor<Bytes>>) -> AppResult<Vec<EntryInfo>> {
        if archive.len() > self.limits.max_archive_entries {
            return Err(AppError::capacity_exceeded(format!(
                "Archive has {} entries, exceeding the limit of {}",
                archive.len(),
                self.limits.max_archive_entries
            )));
        }

        let mut entries = Vec::with_capacity(archive.len());
        let mut total_bytes: u64 = 0;
        for index in 0..archive.len() {
            let entry = archive.by_index(index).map_err(|err| {
                AppError::with_source(ErrorKind::Extraction, "Failed to read archive entry", err)
            })?;
            if entry.enclosed_name().is_none() {
                warn!(entry = entry.name(), "Skipping entry with unsafe path");
                continue;
            }
            total_bytes = total_bytes.saturating_add(entry.size());
            entries.push(EntryInfo {
                index,
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
                size: entry.size(),
            });
        }

        if total_bytes > self.limits.max_archive_bytes {
            return Err(AppError::capacity_exceeded(format!(
                "Archive unpacks to {} bytes, exceeding the limit of {}",
                total_bytes, self.limits.max_archive_bytes
            )));
        }
        Ok(entries)
    }

    /// Walk the entries and create the subtree under `root`.
    ///
    /// Directories are memoized by cumulative path, so entries sharing a
    /// prefix reuse the same folder node whether or not the archive carries
    /// explicit directory entries. Junk entries are persisted hidden rather
    /// than skipped: extraction mirrors the archive, visibility is a
    /// listing concern.
    async fn materialize(
        &self,
        archive: &mut ZipArchive<Cursor<Bytes>>,
        entries: &[EntryInfo],
        root: &Asset,
    ) -> AppResult<()> {
        let owner = root.owner_id;
        let mut folders: HashMap<String, Asset> = HashMap::new();

        for info in entries {
            let components: Vec<&str> = info
                .name
                .trim_end_matches('/')
                .split('/')
                .filter(|c| !c.is_empty() && *c != ".")
                .collect();
            if components.is_empty() {
                continue;
            }

            let (dir_components, file_name) = if info.is_dir {
                (components.as_slice(), None)
            } else {
                let (last, dirs) = components.split_last().map(|(l, d)| (*l, d)).ok_or_else(
                    || AppError::extraction(format!("Malformed entry path: {}", info.name)),
                )?;
                (dirs, Some(last))
            };

            let mut parent = root.clone();
            let mut cumulative = String::new();
            for component in dir_components {
                if cumulative.is_empty() {
                    cumulative.push_str(component);
                } else {
                    cumulative.push('/');
                    cumulative.push_str(component);
                }
                parent = match folders.get(&cumulative) {
                    Some(folder) => folder.clone(),
                    None => {
                        let folder = self
                            .store
                            .insert(Asset::new_directory(owner, &parent, *component));
                        folders.insert(cumulative.clone(), folder.clone());
                        folder
                    }
                };
            }

            let Some(filename) = file_name else {
                continue;
            };

            let content = {
                let mut entry = archive.by_index(info.index).map_err(|err| {
                    AppError::with_source(
                        ErrorKind::Extraction,
                        "Failed to read archive entry",
                        err,
                    )
                })?;
                let mut buf = Vec::with_capacity(info.size as usize);
                entry.read_to_end(&mut buf).map_err(|err| {
                    AppError::with_source(
                        ErrorKind::Extraction,
                        format!("Failed to decompress entry: {}", info.name),
                        err,
                    )
                })?;
                Bytes::from(buf)
            };

            let mut node = Asset::new_file(owner, &parent, filename);
            node.size_bytes = content.len() as u64;
            node.content_type = Some(content_type_for(filename).to_string());
            node.blob = Some(
                self.blobs
                    .put(content, node.content_type.clone())
                    .await?,
            );
            self.store.insert(node);

            if !entry_hidden(&info.name) {
                self.store.bump_progress(root.id)?;
            }
        }
        Ok(())
    }
}

/// Whether an archive entry is junk: its own name is hidden, or it sits
/// under a hidden folder anywhere in its path.
fn entry_hidden(entry_name: &str) -> bool {
    let trimmed = entry_name.trim_end_matches('/');
    let components: Vec<&str> = trimmed.split('/').filter(|c| !c.is_empty()).collect();
    let Some((last, dirs)) = components.split_last() else {
        return false;
    };
    dirs.iter().any(|c| should_hide(c, true)) || should_hide(last, entry_name.ends_with('/'))
}
