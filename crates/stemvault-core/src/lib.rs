//! # stemvault-core
//!
//! Core crate for StemVault. Contains traits for the external collaborators
//! (blob store, task queue), configuration schemas, typed identifiers, and
//! the unified error system.
//!
//! This crate has **no** internal dependencies on other StemVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
