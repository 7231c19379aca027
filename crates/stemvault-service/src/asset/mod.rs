//! Asset tree services: browsing, mutation, cloning, naming.

pub(crate) mod classify;
pub mod clone;
pub mod mutate;
pub mod naming;
pub mod service;
