//! Asset node arena.

use dashmap::DashMap;

use stemvault_core::error::AppError;
use stemvault_core::result::AppResult;
use stemvault_core::types::{AssetId, OwnerId};
use stemvault_entity::asset::{Asset, Processing, ProcessingStatus};

/// Id-keyed arena of asset nodes.
///
/// Each node's `processing` fields are claimed with a conditional write
/// ([`AssetStore::try_claim_processing`]) so two jobs can never race the
/// same node.
#[derive(Debug, Default)]
pub struct AssetStore {
    /// All nodes, keyed by id.
    nodes: DashMap<AssetId, Asset>,
}

impl AssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
        }
    }

    /// Insert a new node and return it.
    pub fn insert(&self, asset: Asset) -> Asset {
        self.nodes.insert(asset.id, asset.clone());
        asset
    }

    /// Fetch a node scoped to its owner.
    ///
    /// An unknown id and an id owned by someone else both report the same
    /// `NotFound`.
    pub fn get(&self, id: AssetId, owner: OwnerId) -> AppResult<Asset> {
        self.nodes
            .get(&id)
            .filter(|node| node.owner_id == owner)
            .map(|node| node.clone())
            .ok_or_else(|| AppError::not_found("Asset no longer exists"))
    }

    /// Fetch a node without owner scoping. Background jobs use this after
    /// the triggering call has already validated ownership.
    pub fn get_unscoped(&self, id: AssetId) -> AppResult<Asset> {
        self.nodes
            .get(&id)
            .map(|node| node.clone())
            .ok_or_else(|| AppError::not_found("Asset no longer exists"))
    }

    /// Apply a closure to a node and return the updated copy.
    pub fn update<F>(&self, id: AssetId, f: F) -> AppResult<Asset>
    where
        F: FnOnce(&mut Asset),
    {
        let mut entry = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Asset no longer exists"))?;
        f(entry.value_mut());
        entry.value_mut().touch();
        Ok(entry.clone())
    }

    /// Claim a node's processing slot with a conditional write from idle to
    /// the given state. Fails with `Conflict` if another job holds the slot.
    pub fn try_claim_processing(&self, id: AssetId, status: ProcessingStatus) -> AppResult<()> {
        let mut entry = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Asset no longer exists"))?;
        if !entry.processing.status.is_idle() {
            return Err(AppError::conflict(format!(
                "Asset is already {}",
                entry.processing.status
            )));
        }
        entry.processing = Processing::started(status, 0);
        entry.touch();
        Ok(())
    }

    /// Set the progress denominator for a claimed node.
    pub fn set_processing_total(&self, id: AssetId, total: u64) -> AppResult<()> {
        self.update(id, |node| node.processing.total = total)?;
        Ok(())
    }

    /// Increment a claimed node's progress counter by one and return the
    /// new value. Persisted immediately so pollers see progress mid-run.
    pub fn bump_progress(&self, id: AssetId) -> AppResult<u64> {
        let updated = self.update(id, |node| node.processing.progress += 1)?;
        Ok(updated.processing.progress)
    }

    /// Clear a node's processing slot back to idle.
    pub fn clear_processing(&self, id: AssetId) -> AppResult<()> {
        self.update(id, |node| node.processing = Processing::idle())?;
        Ok(())
    }

    /// List direct children of a node, owner-scoped, sorted by filename.
    pub fn children(&self, parent_id: AssetId, owner: OwnerId, visible_only: bool) -> Vec<Asset> {
        let mut children: Vec<Asset> = self
            .nodes
            .iter()
            .filter(|node| {
                node.parent_id == Some(parent_id)
                    && node.owner_id == owner
                    && (!visible_only || !node.hidden)
            })
            .map(|node| node.clone())
            .collect();
        children.sort_by(|a, b| a.original_filename.cmp(&b.original_filename));
        children
    }

    /// List an owner's root-level nodes, newest first. `ephemeral` selects
    /// between the library and the quick-share listing.
    pub fn roots(&self, owner: OwnerId, ephemeral: bool) -> Vec<Asset> {
        let mut roots: Vec<Asset> = self
            .nodes
            .iter()
            .filter(|node| {
                node.parent_id.is_none() && node.owner_id == owner && node.ephemeral == ephemeral
            })
            .map(|node| node.clone())
            .collect();
        roots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        roots
    }

    /// Collect all descendants of a node in parent-before-child order.
    pub fn descendants(&self, id: AssetId) -> Vec<Asset> {
        let Ok(root) = self.get_unscoped(id) else {
            return Vec::new();
        };
        let owner = root.owner_id;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for child in self.children(current, owner, false) {
                stack.push(child.id);
                out.push(child);
            }
        }
        out
    }

    /// Delete a node and cascade to all descendants. Returns every removed
    /// node so the caller can release their blob references.
    pub fn delete_cascade(&self, id: AssetId) -> Vec<Asset> {
        let mut removed = Vec::new();
        let descendants = self.descendants(id);
        if let Some((_, node)) = self.nodes.remove(&id) {
            removed.push(node);
        }
        for descendant in descendants {
            if let Some((_, node)) = self.nodes.remove(&descendant.id) {
                removed.push(node);
            }
        }
        removed
    }

    /// Total number of nodes in the arena.
    pub fn count(&self) -> usize {
        self.nodes.len()
    }
}
