//! Per-node processing state for in-flight background jobs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the background job currently materializing a node's subtree.
///
/// These fields are logically owned by exactly one in-flight job; a job
/// claims them with a conditional write from `None` to the new state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// No job is working on this node.
    #[default]
    None,
    /// An archive extraction is populating this node's subtree.
    Extracting,
    /// A clone or copy population is importing into this node's subtree.
    Importing,
}

impl ProcessingStatus {
    /// Check whether the node is free to be claimed by a new job.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Extracting => "extracting",
            Self::Importing => "importing",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transient progress fields for the job materializing this node.
///
/// Cleared to `none/0/0` on completion. Progress is monotonically
/// non-decreasing within one run and persisted after every unit of work,
/// so a concurrent poller always observes `progress <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processing {
    /// Current job status.
    pub status: ProcessingStatus,
    /// Units of work completed so far.
    pub progress: u64,
    /// Total units of work.
    pub total: u64,
}

impl Processing {
    /// The idle state: no job, zeroed counters.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A freshly claimed state with a known total.
    pub fn started(status: ProcessingStatus, total: u64) -> Self {
        Self {
            status,
            progress: 0,
            total,
        }
    }
}
