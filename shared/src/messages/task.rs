//! Task lifecycle messages
//!
//! `TaskOutcome` is the single answer to "what happened to my task?". It is
//! what a poll returns and what the status endpoint serializes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of polling a task by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// No task was ever submitted under this id
    NotFound,
    /// Accepted and queued, no worker has picked it up yet
    Pending,
    /// A worker is processing it
    Running,
    /// Output is published at `output`
    Completed { output: PathBuf },
    /// Terminal failure with a human-readable reason
    Failed { reason: String },
}

impl TaskOutcome {
    /// True for `Completed` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. } | TaskOutcome::Failed { .. })
    }
}

/// Number of tasks per lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running + self.completed + self.failed
    }
}
