//! # stemvault-worker
//!
//! Background job processing for StemVault:
//! - An in-memory task queue feeding a channel-driven worker runner
//! - A job executor that dispatches jobs to the registered handler
//! - Handlers for extraction, assembly, clone population, and cleanup
//! - A periodic sweeper for stale download records

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use queue::InMemoryTaskQueue;
pub use runner::WorkerRunner;
pub use scheduler::spawn_download_sweeper;
