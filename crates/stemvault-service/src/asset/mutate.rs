//! Tree mutation: move, merge, rename.
//!
//! Every structural change recomputes the materialized `path` of the
//! affected node and all of its descendants, parent before child, so a
//! reader never observes a child path inconsistent with an already-updated
//! ancestor.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use stemvault_core::result::AppResult;
use stemvault_core::types::{AssetId, OwnerId};
use stemvault_core::AppError;
use stemvault_entity::asset::{Asset, AssetKind};
use stemvault_store::AssetStore;

use super::naming;

/// Where a batch of nodes should move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Into a directory node.
    Directory(AssetId),
    /// To the top level of the given tree. When the tree's listing skips
    /// into a single wrapper directory, that wrapper is the effective top
    /// level, matching what the caller sees when browsing.
    TreeRoot(AssetId),
    /// Out of any tree, to the owner's library root (`parent_id = None`).
    Library,
}

/// A resolved move destination.
#[derive(Debug, Clone)]
enum ResolvedTarget {
    Node(Asset),
    Library,
}

/// Outcome of a batch move. The batch is not transactional: each node
/// moves or fails independently, and the report lists both sides.
#[derive(Debug, Clone, Default)]
pub struct MoveReport {
    /// Nodes that moved.
    pub moved: Vec<AssetId>,
    /// Nodes that did not, with the reason each was rejected.
    pub failed: Vec<(AssetId, AppError)>,
}

impl MoveReport {
    /// Whether every node in the batch moved.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Service for structural tree mutation.
#[derive(Debug)]
pub struct MutationService {
    store: Arc<AssetStore>,
}

impl MutationService {
    /// Create a new mutation service.
    pub fn new(store: Arc<AssetStore>) -> Self {
        Self { store }
    }

    /// Move a batch of nodes to a new parent.
    ///
    /// An invalid target (missing, or not a directory) fails the whole
    /// batch. Per-node problems — moving a node into itself or into its
    /// own subtree — fail only that node and are reported.
    pub fn move_assets(
        &self,
        owner: OwnerId,
        ids: &[AssetId],
        target: MoveTarget,
    ) -> AppResult<MoveReport> {
        let target_node = self.resolve_target(owner, target)?;

        let mut report = MoveReport::default();
        for &id in ids {
            match self.move_one(owner, id, &target_node) {
                Ok(()) => report.moved.push(id),
                Err(err) => report.failed.push((id, err)),
            }
        }
        info!(
            moved = report.moved.len(),
            failed = report.failed.len(),
            "Moved assets"
        );
        Ok(report)
    }

    /// Gather a batch of nodes into a freshly created sibling folder.
    ///
    /// The folder is created next to the first node and named with the
    /// next free `untitled folder` name; the batch then moves into it.
    pub fn merge_into_new_folder(
        &self,
        owner: OwnerId,
        ids: &[AssetId],
    ) -> AppResult<(Asset, MoveReport)> {
        let Some(&first_id) = ids.first() else {
            return Err(AppError::validation("No assets selected"));
        };
        let first = self.store.get(first_id, owner)?;

        let folder = match first.parent_id {
            Some(parent_id) => {
                let parent = self.store.get(parent_id, owner)?;
                let siblings: Vec<String> = self
                    .store
                    .children(parent.id, owner, true)
                    .into_iter()
                    .map(|a| a.original_filename)
                    .collect();
                let mut folder =
                    Asset::new_directory(owner, &parent, naming::untitled_folder_name(&siblings));
                folder.kind = Some(AssetKind::Folder);
                self.store.insert(folder)
            }
            None => {
                let siblings: Vec<String> = self
                    .store
                    .roots(owner, first.ephemeral)
                    .into_iter()
                    .map(|a| a.title)
                    .collect();
                self.store.insert(Asset::new_root_folder(
                    owner,
                    naming::untitled_folder_name(&siblings),
                ))
            }
        };

        let report = self.move_assets(owner, ids, MoveTarget::Directory(folder.id))?;
        let folder = self.store.get(folder.id, owner)?;
        Ok((folder, report))
    }

    /// Rename a node.
    ///
    /// Root-level nodes keep their original filename and only change
    /// their display title. Deeper nodes change their filename, so their
    /// own path and every descendant path are rewritten.
    pub fn rename(&self, owner: OwnerId, id: AssetId, new_name: &str) -> AppResult<Asset> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::validation("Name cannot be empty"));
        }
        if new_name.contains('/') {
            return Err(AppError::validation("Name cannot contain '/'"));
        }

        let node = self.store.get(id, owner)?;
        if node.is_root() {
            return self.store.update(id, |n| n.title = new_name.to_string());
        }

        let parent_id = node.parent_id.ok_or_else(|| {
            AppError::internal("Non-root node without a parent")
        })?;
        let parent = self.store.get_unscoped(parent_id)?;
        let new_path = Asset::child_path(&parent, new_name);
        let updated = self.store.update(id, |n| {
            n.title = new_name.to_string();
            n.original_filename = new_name.to_string();
            n.path = new_path.clone();
        })?;
        self.rebuild_descendant_paths(&updated)?;
        Ok(updated)
    }

    fn resolve_target(&self, owner: OwnerId, target: MoveTarget) -> AppResult<ResolvedTarget> {
        let node = match target {
            MoveTarget::Library => return Ok(ResolvedTarget::Library),
            MoveTarget::Directory(id) => self.store.get(id, owner)?,
            MoveTarget::TreeRoot(root_id) => {
                let root = self.store.get(root_id, owner)?;
                if !root.is_root() {
                    return Err(AppError::invalid_target("Not a tree root"));
                }
                // Match the browsing view: a single visible wrapper
                // directory is the effective top level.
                let mut top = self.store.children(root.id, owner, true);
                if top.len() == 1 && top[0].is_directory {
                    top.remove(0)
                } else {
                    root
                }
            }
        };
        if !node.is_directory {
            return Err(AppError::invalid_target("Target is not a directory"));
        }
        Ok(ResolvedTarget::Node(node))
    }

    fn move_one(&self, owner: OwnerId, id: AssetId, target: &ResolvedTarget) -> AppResult<()> {
        let node = self.store.get(id, owner)?;

        let ResolvedTarget::Node(target) = target else {
            // Detach to the owner's library root.
            if node.is_root() {
                return Ok(());
            }
            let updated = self.store.update(id, |n| {
                n.parent_id = None;
                n.path = n.segment().to_string();
            })?;
            return self.rebuild_descendant_paths(&updated);
        };

        if node.id == target.id {
            return Err(AppError::invalid_target("Cannot move a node into itself"));
        }
        if node.parent_id == Some(target.id) {
            return Ok(());
        }
        if self.is_descendant_of(target.id, node.id)? {
            return Err(AppError::invalid_target(
                "Cannot move a node into its own subtree",
            ));
        }

        let new_path = Asset::child_path(target, node.segment());
        let updated = self.store.update(id, |n| {
            n.parent_id = Some(target.id);
            n.path = new_path.clone();
        })?;
        self.rebuild_descendant_paths(&updated)
    }

    /// Check whether `node` sits inside the subtree rooted at `ancestor`,
    /// by walking parent links upward.
    fn is_descendant_of(&self, node: AssetId, ancestor: AssetId) -> AppResult<bool> {
        let mut current = self.store.get_unscoped(node)?;
        while let Some(parent_id) = current.parent_id {
            if parent_id == ancestor {
                return Ok(true);
            }
            current = self.store.get_unscoped(parent_id)?;
        }
        Ok(false)
    }

    /// Rewrite the paths of every descendant of an already-updated node,
    /// parent before child.
    fn rebuild_descendant_paths(&self, node: &Asset) -> AppResult<()> {
        let mut paths: HashMap<AssetId, String> = HashMap::new();
        paths.insert(node.id, node.path.clone());

        for descendant in self.store.descendants(node.id) {
            let Some(parent_path) = descendant
                .parent_id
                .and_then(|pid| paths.get(&pid).cloned())
            else {
                continue;
            };
            let new_path = format!("{parent_path}/{}", descendant.segment());
            let updated = self.store.update(descendant.id, |n| n.path = new_path.clone())?;
            paths.insert(descendant.id, updated.path);
        }
        Ok(())
    }
}
