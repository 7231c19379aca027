//! Task queue trait for dispatching background work.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::JobId;

/// Trait for background task queues.
///
/// Delivery is at-least-once; idempotency is the task's responsibility.
/// The in-memory implementation lives in `stemvault-worker`.
#[async_trait]
pub trait TaskQueue: Send + Sync + std::fmt::Debug + 'static {
    /// Enqueue a task of the given kind with a JSON payload.
    async fn enqueue(&self, kind: &str, payload: serde_json::Value) -> AppResult<JobId>;
}
