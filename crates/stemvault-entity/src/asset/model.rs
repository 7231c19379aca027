//! Asset node entity model.
//!
//! An asset is one file or directory in the owned hierarchical store,
//! linked to its parent by id (never by embedded child collections — the
//! tree is an arena of nodes keyed by id). `parent_id = None` means the
//! node sits at the owner's library root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stemvault_core::types::{AssetId, BlobId, OwnerId};

use super::hidden::should_hide;
use super::kind::AssetKind;
use super::status::Processing;

/// A file or directory node in the hierarchical asset store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: AssetId,
    /// The exclusive owner of this node. Cross-owner sharing is modeled as
    /// a full copy, never shared identity.
    pub owner_id: OwnerId,
    /// Parent node ID (None for library-root nodes).
    pub parent_id: Option<AssetId>,
    /// Whether this node is a directory.
    pub is_directory: bool,
    /// User-facing title (meaningful at the root level).
    pub title: String,
    /// Source filename, used to rebuild paths and render listings.
    pub original_filename: String,
    /// Cached materialized path from the node's tree root to itself,
    /// slash-joined. Recomputed by the mutation engine on every structural
    /// change; not a store-enforced invariant.
    pub path: String,
    /// Detected project/audio/file type (None pending detection).
    pub kind: Option<AssetKind>,
    /// True for junk entries (dotfiles, OS metadata, sidecar files).
    pub hidden: bool,
    /// True once an attached archive has been unpacked into children.
    pub extracted: bool,
    /// True for time-boxed quick-share uploads that are excluded from the
    /// normal library listing.
    pub ephemeral: bool,
    /// Attribution when this node was deep-cloned from another owner.
    pub cloned_from_owner: Option<OwnerId>,
    /// Reference to the immutable content blob (absent for directories).
    pub blob: Option<BlobId>,
    /// Content size in bytes (0 for directories).
    pub size_bytes: u64,
    /// MIME type of the content.
    pub content_type: Option<String>,
    /// Transient progress fields owned by the in-flight background job.
    pub processing: Processing,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Create a root-level file node (a fresh upload).
    pub fn new_root(owner_id: OwnerId, title: impl Into<String>, filename: impl Into<String>) -> Self {
        let title = title.into();
        let filename = filename.into();
        let now = Utc::now();
        Self {
            id: AssetId::new(),
            owner_id,
            parent_id: None,
            is_directory: false,
            path: filename.clone(),
            original_filename: filename,
            title,
            kind: None,
            hidden: false,
            extracted: false,
            ephemeral: false,
            cloned_from_owner: None,
            blob: None,
            size_bytes: 0,
            content_type: None,
            processing: Processing::idle(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a root-level folder node.
    pub fn new_root_folder(owner_id: OwnerId, title: impl Into<String>) -> Self {
        let title = title.into();
        let mut asset = Self::new_root(owner_id, title.clone(), title);
        asset.is_directory = true;
        asset.kind = Some(AssetKind::Folder);
        asset
    }

    /// Create a directory node under a parent.
    pub fn new_directory(owner_id: OwnerId, parent: &Asset, name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: AssetId::new(),
            owner_id,
            parent_id: Some(parent.id),
            is_directory: true,
            path: Self::child_path(parent, &name),
            title: name.clone(),
            hidden: should_hide(&name, true),
            original_filename: name,
            kind: None,
            extracted: false,
            ephemeral: false,
            cloned_from_owner: None,
            blob: None,
            size_bytes: 0,
            content_type: None,
            processing: Processing::idle(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a file node under a parent.
    pub fn new_file(owner_id: OwnerId, parent: &Asset, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let now = Utc::now();
        Self {
            id: AssetId::new(),
            owner_id,
            parent_id: Some(parent.id),
            is_directory: false,
            path: Self::child_path(parent, &filename),
            title: filename.clone(),
            hidden: should_hide(&filename, false),
            kind: filename
                .rsplit('.')
                .next()
                .filter(|ext| *ext != filename)
                .and_then(|ext| AssetKind::from_extension(&ext.to_lowercase())),
            original_filename: filename,
            extracted: false,
            ephemeral: false,
            cloned_from_owner: None,
            blob: None,
            size_bytes: 0,
            content_type: None,
            processing: Processing::idle(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute a child's materialized path under a parent node.
    ///
    /// Paths are relative to the tree root: children of a root-level node
    /// start a fresh path, deeper nodes extend their parent's path.
    pub fn child_path(parent: &Asset, segment: &str) -> String {
        if parent.is_root() {
            segment.to_string()
        } else {
            format!("{}/{}", parent.path, segment)
        }
    }

    /// Check if this node sits at the owner's library root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The path segment this node contributes to its descendants' paths.
    pub fn segment(&self) -> &str {
        if self.original_filename.is_empty() {
            &self.title
        } else {
            &self.original_filename
        }
    }

    /// Display name (title for root-level, original filename inside a
    /// listing).
    pub fn display_name(&self) -> &str {
        if self.is_root() && !self.title.is_empty() {
            &self.title
        } else {
            self.segment()
        }
    }

    /// The filename to present on download.
    ///
    /// Root-level assets use the (possibly renamed) title, keeping the
    /// original extension; children use their original filename.
    pub fn download_filename(&self) -> String {
        if !self.is_root() {
            return self.segment().to_string();
        }
        let ext = self.extension();
        if ext.is_empty() || self.title.to_lowercase().ends_with(&format!(".{ext}")) {
            self.title.clone()
        } else {
            format!("{}.{}", self.title, ext)
        }
    }

    /// Get the lowercase file extension, if any.
    pub fn extension(&self) -> String {
        self.original_filename
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.original_filename)
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default()
    }

    /// Bump the updated-at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
