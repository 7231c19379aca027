//! Shared type definitions.

pub mod id;

pub use id::{AssetId, BlobId, DownloadId, JobId, OwnerId};
