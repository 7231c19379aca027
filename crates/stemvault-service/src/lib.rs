//! # stemvault-service
//!
//! Business logic for StemVault: asset trees and browsing, structural
//! mutation, archive extraction and assembly, and download lifecycle.
//! Services hold their collaborators behind `Arc`s and are safe to share
//! across the server and the background worker.

pub mod archive;
pub mod asset;
pub mod download;

pub use archive::assemble::{AssemblyOutput, AssemblyService, PlanContent, PlanEntry};
pub use archive::extract::ExtractionService;
pub use asset::clone::CloneService;
pub use asset::mutate::{MoveReport, MoveTarget, MutationService};
pub use asset::service::{AssetService, Listing};
pub use download::service::{DownloadFile, DownloadPoll, DownloadService};
