//! In-memory blob store.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::stream;

use stemvault_core::error::AppError;
use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::{BlobMeta, BlobStore, ByteStream};
use stemvault_core::types::BlobId;

/// One stored blob with its live reference count.
#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: Option<String>,
    ref_count: u64,
}

/// In-memory, reference-counted blob store. Used in tests and for
/// single-process deployments without a data directory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<BlobId, StoredBlob>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
        }
    }

    /// Number of live blobs (for tests and diagnostics).
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn put(&self, data: Bytes, content_type: Option<String>) -> AppResult<BlobId> {
        let id = BlobId::new();
        self.blobs.insert(
            id,
            StoredBlob {
                data,
                content_type,
                ref_count: 1,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: &BlobId) -> AppResult<Bytes> {
        self.blobs
            .get(id)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))
    }

    async fn read(&self, id: &BlobId) -> AppResult<ByteStream> {
        let data = self.get(id).await?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn retain(&self, id: &BlobId) -> AppResult<()> {
        let mut entry = self
            .blobs
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))?;
        entry.ref_count += 1;
        Ok(())
    }

    async fn release(&self, id: &BlobId) -> AppResult<()> {
        let remaining = {
            let mut entry = self
                .blobs
                .get_mut(id)
                .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))?;
            entry.ref_count = entry.ref_count.saturating_sub(1);
            entry.ref_count
        };
        if remaining == 0 {
            self.blobs.remove(id);
        }
        Ok(())
    }

    async fn metadata(&self, id: &BlobId) -> AppResult<BlobMeta> {
        self.blobs
            .get(id)
            .map(|blob| BlobMeta {
                id: *id,
                size_bytes: blob.data.len() as u64,
                content_type: blob.content_type.clone(),
                ref_count: blob.ref_count,
            })
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))
    }
}
