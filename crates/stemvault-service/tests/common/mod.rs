//! Shared fixtures for service integration tests.

// Not every test target uses every fixture.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use stemvault_blob::MemoryBlobStore;
use stemvault_core::config::downloads::DownloadsConfig;
use stemvault_core::config::limits::LimitsConfig;
use stemvault_core::result::AppResult;
use stemvault_core::traits::blob::{BlobMeta, BlobStore, ByteStream};
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::{AssetId, BlobId, JobId};
use stemvault_entity::asset::Processing;
use stemvault_service::{
    AssemblyService, AssetService, CloneService, DownloadService, ExtractionService,
    MutationService,
};
use stemvault_store::{AssetStore, DownloadStore};

/// Queue double that records enqueued jobs instead of running them.
/// Tests drive the corresponding service calls themselves.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingQueue {
    pub fn kinds(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, _)| kind.clone())
            .collect()
    }
}

#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn enqueue(&self, kind: &str, payload: serde_json::Value) -> AppResult<JobId> {
        self.jobs
            .lock()
            .unwrap()
            .push((kind.to_string(), payload));
        Ok(JobId::new())
    }
}

/// Blob store wrapper that snapshots a watched asset's processing state
/// on every content write and retain. Jobs clear their progress fields on
/// completion, so mid-run denominators are only observable from inside
/// the blob calls the job makes.
#[derive(Debug)]
pub struct ObservingBlobStore {
    inner: MemoryBlobStore,
    assets: Arc<AssetStore>,
    watched: Mutex<Option<AssetId>>,
    snapshots: Mutex<Vec<Processing>>,
}

impl ObservingBlobStore {
    pub fn new(assets: Arc<AssetStore>) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            assets,
            watched: Mutex::new(None),
            snapshots: Mutex::new(Vec::new()),
        }
    }

    pub fn watch(&self, id: AssetId) {
        *self.watched.lock().unwrap() = Some(id);
    }

    pub fn snapshots(&self) -> Vec<Processing> {
        self.snapshots.lock().unwrap().clone()
    }

    fn record(&self) {
        let Some(id) = *self.watched.lock().unwrap() else {
            return;
        };
        if let Ok(asset) = self.assets.get_unscoped(id) {
            self.snapshots.lock().unwrap().push(asset.processing);
        }
    }
}

#[async_trait]
impl BlobStore for ObservingBlobStore {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn put(&self, data: Bytes, content_type: Option<String>) -> AppResult<BlobId> {
        self.record();
        self.inner.put(data, content_type).await
    }

    async fn get(&self, id: &BlobId) -> AppResult<Bytes> {
        self.inner.get(id).await
    }

    async fn read(&self, id: &BlobId) -> AppResult<ByteStream> {
        self.inner.read(id).await
    }

    async fn retain(&self, id: &BlobId) -> AppResult<()> {
        self.record();
        self.inner.retain(id).await
    }

    async fn release(&self, id: &BlobId) -> AppResult<()> {
        self.inner.release(id).await
    }

    async fn metadata(&self, id: &BlobId) -> AppResult<BlobMeta> {
        self.inner.metadata(id).await
    }
}

/// A full service wiring over in-memory stores.
pub struct Env {
    pub assets: Arc<AssetStore>,
    pub downloads: Arc<DownloadStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub queue: Arc<RecordingQueue>,
    pub asset_service: AssetService,
    pub mutation: MutationService,
    pub clones: CloneService,
    pub extraction: ExtractionService,
    pub assembly: AssemblyService,
    pub download_service: DownloadService,
}

impl Env {
    pub fn new() -> Self {
        Self::with_limits(LimitsConfig::default())
    }

    pub fn with_limits(limits: LimitsConfig) -> Self {
        let assets = Arc::new(AssetStore::new());
        let downloads = Arc::new(DownloadStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let queue = Arc::new(RecordingQueue::default());

        let blob_store: Arc<dyn BlobStore> = Arc::clone(&blobs) as Arc<dyn BlobStore>;
        let task_queue: Arc<dyn TaskQueue> = Arc::clone(&queue) as Arc<dyn TaskQueue>;

        Self {
            asset_service: AssetService::new(
                Arc::clone(&assets),
                Arc::clone(&blob_store),
                Arc::clone(&task_queue),
                u64::MAX,
            ),
            mutation: MutationService::new(Arc::clone(&assets)),
            clones: CloneService::new(
                Arc::clone(&assets),
                Arc::clone(&blob_store),
                Arc::clone(&task_queue),
            ),
            extraction: ExtractionService::new(
                Arc::clone(&assets),
                Arc::clone(&blob_store),
                limits.clone(),
            ),
            assembly: AssemblyService::new(
                Arc::clone(&assets),
                Arc::clone(&downloads),
                Arc::clone(&blob_store),
                limits,
            ),
            download_service: DownloadService::new(
                Arc::clone(&downloads),
                Arc::clone(&assets),
                Arc::clone(&blob_store),
                Arc::clone(&task_queue),
                DownloadsConfig::default(),
            ),
            assets,
            downloads,
            blobs,
            queue,
        }
    }
}

/// Build a zip archive in memory from file entries and explicit
/// directory entries.
pub fn build_zip(files: &[(&str, &[u8])], dirs: &[&str]) -> Bytes {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for dir in dirs {
        zip.add_directory(*dir, options).unwrap();
    }
    for (name, data) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }

    Bytes::from(zip.finish().unwrap().into_inner())
}
