//! # stemvault-entity
//!
//! Domain models for StemVault: the [`asset::Asset`] tree node, the
//! [`download::Download`] tracking record, and background [`job`] types.

pub mod asset;
pub mod download;
pub mod job;
