//! Download tracking record: the pollable status object for an eager
//! archive assembly.

pub mod model;
pub mod status;

pub use model::Download;
pub use status::DownloadStatus;
