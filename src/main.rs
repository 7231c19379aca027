//! StemVault server: hierarchical music-asset store.
//!
//! Wires the stores, blob provider, services, and background worker
//! together and runs until a shutdown signal.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use stemvault_blob::{LocalBlobStore, MemoryBlobStore};
use stemvault_core::config::AppConfig;
use stemvault_core::error::AppError;
use stemvault_core::traits::blob::BlobStore;
use stemvault_core::traits::queue::TaskQueue;
use stemvault_service::{AssemblyService, CloneService, DownloadService, ExtractionService};
use stemvault_store::{AssetStore, DownloadStore};
use stemvault_worker::jobs::assembly::AssemblyJobHandler;
use stemvault_worker::jobs::cleanup::DownloadCleanupJobHandler;
use stemvault_worker::jobs::clone::{CloneToOwnerJobHandler, PopulateCopyJobHandler};
use stemvault_worker::jobs::extraction::ExtractionJobHandler;
use stemvault_worker::{spawn_download_sweeper, InMemoryTaskQueue, JobExecutor, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("STEMVAULT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting StemVault v{}", env!("CARGO_PKG_VERSION"));

    // Blob provider.
    let blobs: Arc<dyn BlobStore> = match config.storage.default_provider.as_str() {
        "memory" => Arc::new(MemoryBlobStore::new()),
        _ => Arc::new(LocalBlobStore::new(&config.storage.local.root_path).await?),
    };
    tracing::info!(provider = blobs.provider_type(), "Blob store initialized");

    // Stores and queue.
    let assets = Arc::new(AssetStore::new());
    let downloads = Arc::new(DownloadStore::new());
    let (queue, job_receiver) = InMemoryTaskQueue::channel();
    let task_queue: Arc<dyn TaskQueue> = Arc::clone(&queue) as Arc<dyn TaskQueue>;

    // Services backing the background jobs. The synchronous surfaces
    // (AssetService, MutationService) are constructed by the embedding
    // layer that exposes them.
    let clone_service = Arc::new(CloneService::new(
        Arc::clone(&assets),
        Arc::clone(&blobs),
        Arc::clone(&task_queue),
    ));
    let extraction_service = Arc::new(ExtractionService::new(
        Arc::clone(&assets),
        Arc::clone(&blobs),
        config.limits.clone(),
    ));
    let assembly_service = Arc::new(AssemblyService::new(
        Arc::clone(&assets),
        Arc::clone(&downloads),
        Arc::clone(&blobs),
        config.limits.clone(),
    ));
    let download_service = Arc::new(DownloadService::new(
        Arc::clone(&downloads),
        Arc::clone(&assets),
        Arc::clone(&blobs),
        Arc::clone(&task_queue),
        config.downloads.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Background worker.
    let worker_handle = if config.worker.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(ExtractionJobHandler::new(Arc::clone(
            &extraction_service,
        ))));
        executor.register(Arc::new(AssemblyJobHandler::new(Arc::clone(
            &assembly_service,
        ))));
        executor.register(Arc::new(PopulateCopyJobHandler::new(Arc::clone(
            &clone_service,
        ))));
        executor.register(Arc::new(CloneToOwnerJobHandler::new(Arc::clone(
            &clone_service,
        ))));
        executor.register(Arc::new(DownloadCleanupJobHandler::new(Arc::clone(
            &download_service,
        ))));

        let runner = WorkerRunner::new(
            Arc::clone(&queue),
            job_receiver,
            Arc::new(executor),
            config.worker.clone(),
        );
        let handle = tokio::spawn(runner.run(shutdown_rx.clone()));
        tracing::info!("Background worker started");
        Some(handle)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // Periodic download sweep.
    let sweeper_handle = spawn_download_sweeper(
        Arc::clone(&queue),
        config.downloads.sweep_interval_seconds,
        shutdown_rx.clone(),
    );

    tracing::info!("StemVault running, waiting for shutdown signal");
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        let grace = std::time::Duration::from_secs(config.worker.shutdown_grace_seconds + 5);
        let _ = tokio::time::timeout(grace, handle).await;
    }
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), sweeper_handle).await;

    tracing::info!("StemVault shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
