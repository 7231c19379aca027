//! Download lifecycle service.

pub mod service;
