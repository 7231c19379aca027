//! # stemvault-store
//!
//! The persistent arena for StemVault. The self-referential asset tree is
//! stored as an arena of nodes keyed by id with parent-id references —
//! never as child collections embedded inside parent objects — so recursive
//! walks operate over the arena by id, not by following live object graphs.
//!
//! All reads are owner-scoped; fetching a node not owned by the caller
//! fails with `NotFound`, never a permission error, so existence is not
//! leaked.

pub mod asset;
pub mod download;

pub use asset::AssetStore;
pub use download::DownloadStore;
