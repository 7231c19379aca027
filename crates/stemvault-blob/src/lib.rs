//! # stemvault-blob
//!
//! Content blob store implementations for StemVault. Blobs are immutable
//! and reference-counted: deep clones share content by reference, and a
//! blob is physically deleted only when its last reference is released, so
//! deletion by one owner never invalidates another owner's clone.

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
