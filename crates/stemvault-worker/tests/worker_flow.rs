//! Full wiring test: services enqueue jobs, the runner executes them.

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use stemvault_blob::MemoryBlobStore;
use stemvault_core::config::downloads::DownloadsConfig;
use stemvault_core::config::limits::LimitsConfig;
use stemvault_core::config::worker::WorkerConfig;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_core::types::OwnerId;
use stemvault_entity::download::DownloadStatus;
use stemvault_service::{
    AssemblyService, AssetService, CloneService, DownloadService, ExtractionService,
};
use stemvault_store::{AssetStore, DownloadStore};
use stemvault_worker::jobs::assembly::AssemblyJobHandler;
use stemvault_worker::jobs::cleanup::DownloadCleanupJobHandler;
use stemvault_worker::jobs::clone::{CloneToOwnerJobHandler, PopulateCopyJobHandler};
use stemvault_worker::jobs::extraction::ExtractionJobHandler;
use stemvault_worker::{InMemoryTaskQueue, JobExecutor, WorkerRunner};

struct App {
    assets: Arc<AssetStore>,
    asset_service: Arc<AssetService>,
    clones: Arc<CloneService>,
    download_service: Arc<DownloadService>,
    queue: Arc<InMemoryTaskQueue>,
    cancel: watch::Sender<bool>,
    runner: tokio::task::JoinHandle<()>,
}

fn wire() -> App {
    let assets = Arc::new(AssetStore::new());
    let downloads = Arc::new(DownloadStore::new());
    let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let (queue, receiver) = InMemoryTaskQueue::channel();
    let task_queue: Arc<dyn TaskQueue> = Arc::clone(&queue) as Arc<dyn TaskQueue>;
    let limits = LimitsConfig::default();

    let asset_service = Arc::new(AssetService::new(
        Arc::clone(&assets),
        Arc::clone(&blobs),
        Arc::clone(&task_queue),
        u64::MAX,
    ));
    let clones = Arc::new(CloneService::new(
        Arc::clone(&assets),
        Arc::clone(&blobs),
        Arc::clone(&task_queue),
    ));
    let extraction = Arc::new(ExtractionService::new(
        Arc::clone(&assets),
        Arc::clone(&blobs),
        limits.clone(),
    ));
    let assembly = Arc::new(AssemblyService::new(
        Arc::clone(&assets),
        Arc::clone(&downloads),
        Arc::clone(&blobs),
        limits,
    ));
    let download_service = Arc::new(DownloadService::new(
        Arc::clone(&downloads),
        Arc::clone(&assets),
        Arc::clone(&blobs),
        Arc::clone(&task_queue),
        DownloadsConfig::default(),
    ));

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(ExtractionJobHandler::new(extraction)));
    executor.register(Arc::new(AssemblyJobHandler::new(Arc::clone(&assembly))));
    executor.register(Arc::new(PopulateCopyJobHandler::new(Arc::clone(&clones))));
    executor.register(Arc::new(CloneToOwnerJobHandler::new(Arc::clone(&clones))));
    executor.register(Arc::new(DownloadCleanupJobHandler::new(Arc::clone(
        &download_service,
    ))));

    let runner = WorkerRunner::new(
        Arc::clone(&queue),
        receiver,
        Arc::new(executor),
        WorkerConfig::default(),
    );
    let (cancel, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(runner.run(cancel_rx));

    App {
        assets,
        asset_service,
        clones,
        download_service,
        queue,
        cancel,
        runner: handle,
    }
}

fn sample_zip() -> Bytes {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("Song/Song.als", options).unwrap();
    zip.write_all(b"project").unwrap();
    zip.start_file("Song/Kick.wav", options).unwrap();
    zip.write_all(b"kick").unwrap();
    Bytes::from(zip.finish().unwrap().into_inner())
}

/// Poll until the predicate holds or a timeout elapses.
async fn wait_for<F: Fn() -> bool>(predicate: F) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_upload_to_download_through_worker() {
    let app = wire();
    let owner = OwnerId::new();

    // Upload enqueues extraction; the worker picks it up.
    let root = app
        .asset_service
        .upload(owner, "Song.zip", "Song.zip", sample_zip(), false)
        .await
        .unwrap();
    wait_for(|| {
        app.assets
            .get_unscoped(root.id)
            .map(|a| a.extracted)
            .unwrap_or(false)
    })
    .await;

    let listing = app.asset_service.browse(owner, root.id, None).unwrap();
    assert!(listing.skipped_root.is_some());
    assert_eq!(listing.entries.len(), 2);

    // Duplicate populates through the worker too.
    let copy = app.clones.duplicate(owner, root.id).await.unwrap();
    wait_for(|| {
        app.assets
            .get_unscoped(copy.id)
            .map(|a| a.processing.status.is_idle())
            .unwrap_or(false)
    })
    .await;
    assert_eq!(
        app.assets.descendants(copy.id).len(),
        app.assets.descendants(root.id).len()
    );

    // Download request assembles in the background.
    let record = app.download_service.request(owner, root.id).await.unwrap();
    wait_for(|| {
        app.download_service
            .status(owner, record.id)
            .map(|p| p.status == DownloadStatus::Ready)
            .unwrap_or(false)
    })
    .await;

    let file = app
        .download_service
        .take_file(owner, record.id)
        .await
        .unwrap();
    assert!(file.filename.ends_with(".zip"));
    assert!(file.size_bytes > 0);

    // Cleanup job runs on demand.
    let cleanup = stemvault_entity::job::JobPayload::DownloadCleanup;
    let job_id = app
        .queue
        .enqueue(cleanup.kind(), serde_json::to_value(&cleanup).unwrap())
        .await
        .unwrap();
    wait_for(|| {
        app.queue
            .get(job_id)
            .map(|j| j.status == stemvault_entity::job::JobStatus::Completed)
            .unwrap_or(false)
    })
    .await;

    app.cancel.send(true).unwrap();
    app.runner.await.unwrap();
}
