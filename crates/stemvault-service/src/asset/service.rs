//! Asset tree service: uploads, folder creation, browsing, deletion.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::{AssetId, OwnerId};
use stemvault_core::AppError;
use stemvault_entity::asset::kind::content_type_for;
use stemvault_entity::asset::{Asset, AssetKind};
use stemvault_entity::job::JobPayload;
use stemvault_store::AssetStore;

use super::naming;

/// A resolved directory listing.
///
/// When a root's only visible child is a single directory (the usual
/// "everything wrapped in one folder" archive shape), browsing the root
/// skips straight into that wrapper. The skip is resolved on every call,
/// never stored, so it tracks later mutations.
#[derive(Debug, Clone)]
pub struct Listing {
    /// The tree root that was browsed.
    pub root: Asset,
    /// The wrapper directory that was skipped, if any.
    pub skipped_root: Option<Asset>,
    /// The directory whose entries are listed.
    pub current: Asset,
    /// Visible entries of `current`, sorted by filename.
    pub entries: Vec<Asset>,
}

/// Service for asset uploads and tree browsing.
#[derive(Debug)]
pub struct AssetService {
    store: Arc<AssetStore>,
    blobs: Arc<dyn BlobStore>,
    queue: Arc<dyn TaskQueue>,
    max_upload_size_bytes: u64,
}

impl AssetService {
    /// Create a new asset service.
    pub fn new(
        store: Arc<AssetStore>,
        blobs: Arc<dyn BlobStore>,
        queue: Arc<dyn TaskQueue>,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            store,
            blobs,
            queue,
            max_upload_size_bytes,
        }
    }

    /// Upload a file as a new root-level asset.
    ///
    /// Zip uploads are stored as-is and an extraction job is enqueued;
    /// the upload returns immediately while the subtree materializes in
    /// the background.
    pub async fn upload(
        &self,
        owner: OwnerId,
        title: &str,
        filename: &str,
        data: Bytes,
        ephemeral: bool,
    ) -> AppResult<Asset> {
        self.check_upload_size(data.len())?;

        let mut asset = Asset::new_root(owner, title, filename);
        asset.ephemeral = ephemeral;
        asset.size_bytes = data.len() as u64;
        asset.content_type = Some(content_type_for(filename).to_string());
        asset.kind = AssetKind::from_extension(&asset.extension());
        asset.blob = Some(self.blobs.put(data, asset.content_type.clone()).await?);
        let asset = self.store.insert(asset);

        if asset.extension() == "zip" {
            let payload = JobPayload::ArchiveExtraction {
                asset_id: asset.id,
                owner_id: owner,
            };
            self.queue
                .enqueue(payload.kind(), serde_json::to_value(&payload)?)
                .await?;
            info!(asset = %asset.id, "Enqueued archive extraction");
        }

        info!(asset = %asset.id, filename, bytes = asset.size_bytes, "Uploaded asset");
        Ok(asset)
    }

    /// Upload a file into an existing directory of a tree.
    pub async fn upload_into(
        &self,
        owner: OwnerId,
        parent_id: AssetId,
        filename: &str,
        data: Bytes,
    ) -> AppResult<Asset> {
        self.check_upload_size(data.len())?;

        let parent = self.store.get(parent_id, owner)?;
        if !parent.is_directory {
            return Err(AppError::invalid_target("Target is not a directory"));
        }

        let mut asset = Asset::new_file(owner, &parent, filename);
        asset.size_bytes = data.len() as u64;
        asset.content_type = Some(content_type_for(filename).to_string());
        asset.blob = Some(self.blobs.put(data, asset.content_type.clone()).await?);
        Ok(self.store.insert(asset))
    }

    /// Create a folder at the owner's library root.
    ///
    /// Without a name, picks the next free `untitled folder` name among
    /// the owner's root-level assets.
    pub fn create_root_folder(&self, owner: OwnerId, name: Option<&str>) -> AppResult<Asset> {
        let name = match name {
            Some(n) => validated_name(n)?,
            None => {
                let siblings: Vec<String> = self
                    .store
                    .roots(owner, false)
                    .into_iter()
                    .map(|a| a.title)
                    .collect();
                naming::untitled_folder_name(&siblings)
            }
        };
        Ok(self.store.insert(Asset::new_root_folder(owner, name)))
    }

    /// Create a folder inside an existing directory.
    pub fn create_folder(
        &self,
        owner: OwnerId,
        parent_id: AssetId,
        name: Option<&str>,
    ) -> AppResult<Asset> {
        let parent = self.store.get(parent_id, owner)?;
        if !parent.is_directory {
            return Err(AppError::invalid_target("Target is not a directory"));
        }

        let name = match name {
            Some(n) => validated_name(n)?,
            None => {
                let siblings: Vec<String> = self
                    .store
                    .children(parent.id, owner, true)
                    .into_iter()
                    .map(|a| a.original_filename)
                    .collect();
                naming::untitled_folder_name(&siblings)
            }
        };

        let mut folder = Asset::new_directory(owner, &parent, name);
        folder.kind = Some(AssetKind::Folder);
        Ok(self.store.insert(folder))
    }

    /// Fetch one asset, owner-scoped.
    pub fn get(&self, owner: OwnerId, id: AssetId) -> AppResult<Asset> {
        self.store.get(id, owner)
    }

    /// The owner's library (non-ephemeral root assets, newest first).
    pub fn library(&self, owner: OwnerId) -> Vec<Asset> {
        self.store.roots(owner, false)
    }

    /// The owner's quick-share uploads (ephemeral roots, newest first).
    pub fn quick_shares(&self, owner: OwnerId) -> Vec<Asset> {
        self.store.roots(owner, true)
    }

    /// Browse a tree, resolving the single-wrapper-directory skip.
    ///
    /// With `folder_id`, lists that directory. Without, lists the root's
    /// visible entries; if those are exactly one directory, descends into
    /// it and reports it as the skipped wrapper.
    pub fn browse(
        &self,
        owner: OwnerId,
        root_id: AssetId,
        folder_id: Option<AssetId>,
    ) -> AppResult<Listing> {
        let root = self.store.get(root_id, owner)?;

        if let Some(folder_id) = folder_id {
            let current = self.store.get(folder_id, owner)?;
            if !current.is_directory {
                return Err(AppError::invalid_target("Target is not a directory"));
            }
            let entries = self.store.children(current.id, owner, true);
            return Ok(Listing {
                root,
                skipped_root: None,
                current,
                entries,
            });
        }

        let mut top = self.store.children(root.id, owner, true);
        if top.len() == 1 && top[0].is_directory {
            let wrapper = top.remove(0);
            let entries = self.store.children(wrapper.id, owner, true);
            return Ok(Listing {
                root,
                skipped_root: Some(wrapper.clone()),
                current: wrapper,
                entries,
            });
        }

        Ok(Listing {
            root: root.clone(),
            skipped_root: None,
            current: root,
            entries: top,
        })
    }

    /// Delete an asset and its whole subtree, releasing content blobs.
    ///
    /// Blobs shared with a clone survive: they are reference-counted and
    /// only disappear with their last holder.
    pub async fn delete(&self, owner: OwnerId, id: AssetId) -> AppResult<usize> {
        self.store.get(id, owner)?;
        let removed = self.store.delete_cascade(id);
        for node in &removed {
            if let Some(blob) = &node.blob {
                if let Err(err) = self.blobs.release(blob).await {
                    warn!(asset = %node.id, blob = %blob, error = %err, "Failed to release blob");
                }
            }
        }
        info!(asset = %id, removed = removed.len(), "Deleted asset subtree");
        Ok(removed.len())
    }

    fn check_upload_size(&self, len: usize) -> AppResult<()> {
        if len as u64 > self.max_upload_size_bytes {
            return Err(AppError::capacity_exceeded(format!(
                "Upload exceeds the maximum size of {} bytes",
                self.max_upload_size_bytes
            )));
        }
        Ok(())
    }
}

/// Validate a user-supplied folder or file name.
fn validated_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if trimmed.contains('/') {
        return Err(AppError::validation("Name cannot contain '/'"));
    }
    Ok(trimmed.to_string())
}
