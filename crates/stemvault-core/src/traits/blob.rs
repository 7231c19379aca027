//! Blob store trait for pluggable content storage backends.
//!
//! Blobs are immutable and reference-counted by attachment: a deep clone
//! shares the original's blobs instead of copying bytes, and a blob is only
//! physically deleted when the last reference is released.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;
use crate::types::BlobId;

/// Metadata about a stored blob.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlobMeta {
    /// Blob identifier.
    pub id: BlobId,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME type recorded at put time (if known).
    pub content_type: Option<String>,
    /// Number of live references.
    pub ref_count: u64,
}

/// A byte stream type used for reading blob contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for content blob storage backends.
///
/// Implementations exist for in-memory and local filesystem storage in
/// `stemvault-blob`. A newly `put` blob starts with a reference count of 1.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Store a new immutable blob and return its reference.
    async fn put(&self, data: Bytes, content_type: Option<String>) -> AppResult<BlobId>;

    /// Read a blob into memory as a complete byte vector.
    async fn get(&self, id: &BlobId) -> AppResult<Bytes>;

    /// Read a blob and return its byte stream.
    async fn read(&self, id: &BlobId) -> AppResult<ByteStream>;

    /// Increment the blob's reference count (an additional node now
    /// references the same content).
    async fn retain(&self, id: &BlobId) -> AppResult<()>;

    /// Decrement the blob's reference count. The blob is physically
    /// deleted when the count reaches zero.
    async fn release(&self, id: &BlobId) -> AppResult<()>;

    /// Get metadata about a blob.
    async fn metadata(&self, id: &BlobId) -> AppResult<BlobMeta>;
}
