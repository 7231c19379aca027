//! Local filesystem blob store.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use stemvault_core::error::{AppError, ErrorKind};
use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::{BlobMeta, BlobStore, ByteStream};
use stemvault_core::types::BlobId;

/// Bookkeeping for a blob on disk.
#[derive(Debug, Clone)]
struct LocalBlobEntry {
    size_bytes: u64,
    content_type: Option<String>,
    ref_count: u64,
}

/// Local filesystem blob store. Content lives in one flat directory keyed
/// by blob id; reference counts are tracked in process.
#[derive(Debug)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
    /// Per-blob bookkeeping.
    entries: DashMap<BlobId, LocalBlobEntry>,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            entries: DashMap::new(),
        })
    }

    /// Resolve a blob id to its on-disk path.
    fn resolve(&self, id: &BlobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn entry(&self, id: &BlobId) -> AppResult<LocalBlobEntry> {
        self.entries
            .get(id)
            .map(|entry| entry.clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn put(&self, data: Bytes, content_type: Option<String>) -> AppResult<BlobId> {
        let id = BlobId::new();
        let path = self.resolve(&id);
        fs::write(&path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write blob: {}", path.display()),
                e,
            )
        })?;
        self.entries.insert(
            id,
            LocalBlobEntry {
                size_bytes: data.len() as u64,
                content_type,
                ref_count: 1,
            },
        );
        debug!(blob = %id, bytes = data.len(), "Wrote blob");
        Ok(id)
    }

    async fn get(&self, id: &BlobId) -> AppResult<Bytes> {
        self.entry(id)?;
        let path = self.resolve(id);
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {id}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to read blob: {id}"), e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn read(&self, id: &BlobId) -> AppResult<ByteStream> {
        self.entry(id)?;
        let path = self.resolve(id);
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {id}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to open blob: {id}"), e)
            }
        })?;
        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(|b| b.into()))))
    }

    async fn retain(&self, id: &BlobId) -> AppResult<()> {
        let mut entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))?;
        entry.ref_count += 1;
        Ok(())
    }

    async fn release(&self, id: &BlobId) -> AppResult<()> {
        let remaining = {
            let mut entry = self
                .entries
                .get_mut(id)
                .ok_or_else(|| AppError::not_found(format!("Blob not found: {id}")))?;
            entry.ref_count = entry.ref_count.saturating_sub(1);
            entry.ref_count
        };
        if remaining == 0 {
            self.entries.remove(id);
            let path = self.resolve(id);
            fs::remove_file(&path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete blob: {id}"),
                    e,
                )
            })?;
            debug!(blob = %id, "Deleted blob at zero references");
        }
        Ok(())
    }

    async fn metadata(&self, id: &BlobId) -> AppResult<BlobMeta> {
        let entry = self.entry(id)?;
        Ok(BlobMeta {
            id: *id,
            size_bytes: entry.size_bytes,
            content_type: entry.content_type,
            ref_count: entry.ref_count,
        })
    }
}
