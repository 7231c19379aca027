//! Asset node entity: one file or directory in the owned hierarchical store.

pub mod hidden;
pub mod kind;
pub mod model;
pub mod status;

pub use hidden::should_hide;
pub use kind::AssetKind;
pub use model::Asset;
pub use status::{Processing, ProcessingStatus};
