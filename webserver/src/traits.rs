//! Service trait definitions for dependency injection
//!
//! Handlers only see `TaskService`, so the HTTP layer can be tested against
//! a mock without spinning up workers or touching disk.

use async_trait::async_trait;
use orchestrator::{ByteStream, FileSystem, Orchestrator};
use shared::{TaskCounts, TaskId, TaskOutcome};

use crate::error::WebServerResult;

/// Task submission and polling
#[mockall::automock]
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Persist an upload and schedule it; returns once the task is queued
    async fn submit(&self, body: ByteStream) -> WebServerResult<TaskId>;

    /// Current outcome of a task, `NotFound` for unknown ids
    async fn outcome(&self, task_id: &TaskId) -> TaskOutcome;

    /// Number of tasks in each lifecycle state
    async fn counts(&self) -> TaskCounts;
}

#[async_trait]
impl<F> TaskService for Orchestrator<F>
where
    F: FileSystem + 'static,
{
    async fn submit(&self, body: ByteStream) -> WebServerResult<TaskId> {
        Ok(Orchestrator::submit(self, body).await?)
    }

    async fn outcome(&self, task_id: &TaskId) -> TaskOutcome {
        self.result(task_id).await
    }

    async fn counts(&self) -> TaskCounts {
        self.task_counts().await
    }
}
