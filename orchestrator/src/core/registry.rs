//! Task registry
//!
//! Maps task ids to their lifecycle state. This is the only state shared
//! between the submission path, the workers and pollers. Every write holds
//! the lock for a single map operation and readers get cloned snapshots, so a
//! reader sees a task either before or after a transition, never halfway.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use shared::{TaskCounts, TaskId, TaskOutcome};
use tokio::sync::RwLock;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Lifecycle state of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed { output: PathBuf },
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed { .. } | TaskStatus::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed { .. } => "completed",
            TaskStatus::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    fn pending(id: TaskId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Caller-facing view of this task
    pub fn outcome(&self) -> TaskOutcome {
        match &self.status {
            TaskStatus::Pending => TaskOutcome::Pending,
            TaskStatus::Running => TaskOutcome::Running,
            TaskStatus::Completed { output } => TaskOutcome::Completed { output: output.clone() },
            TaskStatus::Failed { reason } => TaskOutcome::Failed { reason: reason.clone() },
        }
    }
}

/// In-memory task registry; nothing survives a restart
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and store a pending task under it
    pub async fn create(&self) -> OrchestratorResult<TaskId> {
        let id = TaskId::new();
        self.register(id.clone()).await?;
        Ok(id)
    }

    /// Store a pending task under an id allocated by the caller
    pub async fn register(&self, id: TaskId) -> OrchestratorResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&id) {
            return Err(OrchestratorError::DuplicateTask { task_id: id.to_string() });
        }
        tasks.insert(id.clone(), Task::pending(id));
        Ok(())
    }

    /// Drop a task that was registered but never handed to a worker
    ///
    /// Only pending tasks can be withdrawn; anything a worker has touched
    /// stays in the registry.
    pub async fn withdraw(&self, id: &TaskId) -> OrchestratorResult<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get(id).map(|task| &task.status) {
            Some(TaskStatus::Pending) => {
                tasks.remove(id);
                Ok(())
            }
            Some(status) => Err(OrchestratorError::InvalidTransition {
                task_id: id.to_string(),
                from: status.to_string(),
                to: "withdrawn".to_string(),
            }),
            None => Err(OrchestratorError::TaskNotFound { task_id: id.to_string() }),
        }
    }

    pub async fn mark_running(&self, id: &TaskId) -> OrchestratorResult<()> {
        self.transition(id, TaskStatus::Running).await
    }

    pub async fn mark_completed(&self, id: &TaskId, output: PathBuf) -> OrchestratorResult<()> {
        self.transition(id, TaskStatus::Completed { output }).await
    }

    pub async fn mark_failed(&self, id: &TaskId, reason: impl Into<String>) -> OrchestratorResult<()> {
        self.transition(id, TaskStatus::Failed { reason: reason.into() }).await
    }

    /// Snapshot of a task, `None` for ids never registered
    pub async fn lookup(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Per-state task counts
    pub async fn counts(&self) -> TaskCounts {
        let tasks = self.tasks.read().await;
        let mut counts = TaskCounts::default();
        for task in tasks.values() {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Completed { .. } => counts.completed += 1,
                TaskStatus::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    /// Apply a transition if the current state allows it
    ///
    /// Allowed: pending → running, running → completed | failed, and
    /// pending → failed for tasks that could never be scheduled.
    async fn transition(&self, id: &TaskId, next: TaskStatus) -> OrchestratorResult<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::TaskNotFound { task_id: id.to_string() })?;

        let allowed = matches!(
            (&task.status, &next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Failed { .. })
                | (TaskStatus::Running, TaskStatus::Completed { .. })
                | (TaskStatus::Running, TaskStatus::Failed { .. })
        );

        if !allowed {
            return Err(OrchestratorError::InvalidTransition {
                task_id: id.to_string(),
                from: task.status.to_string(),
                to: next.to_string(),
            });
        }

        task.status = next;
        task.updated_at = Utc::now();
        Ok(())
    }
}
