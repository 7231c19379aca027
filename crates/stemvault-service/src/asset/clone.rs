//! Duplication and cross-owner deep cloning.
//!
//! Clones never copy content: the new nodes hold references to the same
//! blobs, with the blob store's reference counts keeping content alive
//! until the last holder is deleted. The cloned root appears immediately
//! as a placeholder in `importing` state; a background job fills in the
//! subtree and reports per-node progress on the placeholder.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::{AssetId, OwnerId};
use stemvault_core::AppError;
use stemvault_entity::asset::{Asset, Processing, ProcessingStatus};
use stemvault_entity::job::JobPayload;
use stemvault_store::AssetStore;

use super::naming;

/// Service for duplicating assets and deep-cloning them across owners.
#[derive(Debug)]
pub struct CloneService {
    store: Arc<AssetStore>,
    blobs: Arc<dyn BlobStore>,
    queue: Arc<dyn TaskQueue>,
}

impl CloneService {
    /// Create a new clone service.
    pub fn new(
        store: Arc<AssetStore>,
        blobs: Arc<dyn BlobStore>,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self { store, blobs, queue }
    }

    /// Duplicate a root-level asset within the same owner's library.
    ///
    /// The copy gets the next free `Title (copy)` name. Directory roots
    /// return immediately with their subtree populating in the background.
    pub async fn duplicate(&self, owner: OwnerId, id: AssetId) -> AppResult<Asset> {
        let source = self.store.get(id, owner)?;
        if !source.is_root() {
            return Err(AppError::validation(
                "Only top-level assets can be duplicated",
            ));
        }

        let titles: Vec<String> = self
            .store
            .roots(owner, source.ephemeral)
            .into_iter()
            .map(|a| a.title)
            .collect();
        let title = naming::copy_title(&source.title, &titles);

        let copy = self
            .materialize_root_copy(&source, owner, title, None)
            .await?;

        if source.is_directory {
            self.store
                .try_claim_processing(copy.id, ProcessingStatus::Importing)?;
            let payload = JobPayload::PopulateCopy {
                source_id: source.id,
                copy_id: copy.id,
                owner_id: owner,
            };
            self.queue
                .enqueue(payload.kind(), serde_json::to_value(&payload)?)
                .await?;
        }

        info!(source = %source.id, copy = %copy.id, "Duplicated asset");
        self.store.get(copy.id, owner)
    }

    /// Deep-clone another owner's root asset into `new_owner`'s library.
    ///
    /// Returns the placeholder root right away, claimed in `importing`
    /// state; a background job populates the subtree.
    pub async fn clone_to_owner(
        &self,
        source_owner: OwnerId,
        source_id: AssetId,
        new_owner: OwnerId,
    ) -> AppResult<Asset> {
        let source = self.store.get(source_id, source_owner)?;
        if !source.is_root() {
            return Err(AppError::validation("Only top-level assets can be saved"));
        }

        let placeholder = self
            .materialize_root_copy(&source, new_owner, source.title.clone(), Some(source_owner))
            .await?;
        self.store
            .try_claim_processing(placeholder.id, ProcessingStatus::Importing)?;

        let payload = JobPayload::CloneToOwner {
            source_id: source.id,
            source_owner_id: source_owner,
            placeholder_id: placeholder.id,
            new_owner_id: new_owner,
        };
        self.queue
            .enqueue(payload.kind(), serde_json::to_value(&payload)?)
            .await?;

        info!(
            source = %source.id,
            placeholder = %placeholder.id,
            new_owner = %new_owner,
            "Enqueued deep clone"
        );
        self.store.get(placeholder.id, new_owner)
    }

    /// Populate a cloned root's subtree from its source, parent before
    /// child. Used by both the duplicate and the cross-owner clone jobs.
    ///
    /// Progress counts nodes, the already-materialized root included, so
    /// a subtree of N nodes reports `N/N` when done.
    pub async fn populate(&self, source_id: AssetId, target_root_id: AssetId) -> AppResult<()> {
        let target_root = self.store.get_unscoped(target_root_id)?;
        let owner = target_root.owner_id;
        let descendants = self.store.descendants(source_id);

        self.store
            .set_processing_total(target_root_id, descendants.len() as u64 + 1)?;
        self.store.bump_progress(target_root_id)?;

        let mut new_nodes: HashMap<AssetId, Asset> = HashMap::new();
        new_nodes.insert(source_id, target_root);

        for source_node in descendants {
            let Some(new_parent) = source_node
                .parent_id
                .and_then(|pid| new_nodes.get(&pid))
            else {
                continue;
            };

            let mut node = if source_node.is_directory {
                Asset::new_directory(owner, new_parent, source_node.segment())
            } else {
                Asset::new_file(owner, new_parent, source_node.segment())
            };
            node.title = source_node.title.clone();
            node.kind = source_node.kind;
            node.hidden = source_node.hidden;
            node.extracted = source_node.extracted;
            node.size_bytes = source_node.size_bytes;
            node.content_type = source_node.content_type.clone();
            if let Some(blob) = &source_node.blob {
                self.blobs.retain(blob).await?;
                node.blob = Some(*blob);
            }

            let node = self.store.insert(node);
            new_nodes.insert(source_node.id, node);
            self.store.bump_progress(target_root_id)?;
        }

        self.store.clear_processing(target_root_id)?;
        info!(
            source = %source_id,
            target = %target_root_id,
            nodes = new_nodes.len(),
            "Populated cloned subtree"
        );
        Ok(())
    }

    /// Create the root node of a copy: same content and metadata, fresh
    /// identity and timestamps, blob re-attached by reference.
    async fn materialize_root_copy(
        &self,
        source: &Asset,
        owner: OwnerId,
        title: String,
        cloned_from: Option<OwnerId>,
    ) -> AppResult<Asset> {
        let now = Utc::now();
        let mut copy = source.clone();
        copy.id = AssetId::new();
        copy.owner_id = owner;
        copy.title = title;
        copy.cloned_from_owner = cloned_from;
        copy.ephemeral = false;
        copy.processing = Processing::idle();
        copy.created_at = now;
        copy.updated_at = now;

        if let Some(blob) = &copy.blob {
            self.blobs.retain(blob).await?;
        }
        Ok(self.store.insert(copy))
    }
}
