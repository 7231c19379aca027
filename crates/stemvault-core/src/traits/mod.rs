//! Traits for external collaborators.
//!
//! The core engines never talk to a concrete blob store or task queue;
//! they depend on the traits defined here, which are implemented in the
//! `stemvault-blob` and `stemvault-worker` crates.

pub mod blob;
pub mod queue;

pub use blob::{BlobMeta, BlobStore, ByteStream};
pub use queue::TaskQueue;
