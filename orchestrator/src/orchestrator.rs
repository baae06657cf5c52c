//! Main orchestrator implementation
//!
//! Accepts uploads, hands task ids to a bounded pool of background workers
//! over a queue, and answers polls from the task registry. Submission only
//! persists the input and allocates an id; all processing happens on the
//! workers.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use shared::{logging, process_debug, process_error, process_info, process_warn, ProcessId, TaskCounts, TaskId, TaskOutcome};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::core::{aggregate_csv, TaskRegistry};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ByteStream, FileSystem};

/// Runs one task end to end on behalf of a worker
struct PipelineRunner<F: FileSystem + 'static> {
    file_system: Arc<F>,
    registry: Arc<TaskRegistry>,
    batch_size: usize,
}

impl<F: FileSystem + 'static> PipelineRunner<F> {
    /// Drive a pending task to a terminal state
    ///
    /// Errors returned here are registry invariant violations; pipeline
    /// failures are recorded on the task instead.
    async fn run(&self, task_id: &TaskId) -> OrchestratorResult<()> {
        self.registry.mark_running(task_id).await?;
        process_debug!(ProcessId::current(), "⚙️ Task {} running", task_id);

        match self.execute(task_id).await {
            Ok(output) => {
                self.registry.mark_completed(task_id, output).await?;
                process_info!(ProcessId::current(), "✅ Task {} completed", task_id);
            }
            Err(e) => {
                if let Err(cleanup) = self.file_system.discard_output(task_id).await {
                    process_warn!(ProcessId::current(), "⚠️ Could not remove staging output for {}: {}", task_id, cleanup);
                }
                process_warn!(ProcessId::current(), "❌ Task {} failed: {}", task_id, e);
                self.registry.mark_failed(task_id, e.task_reason()).await?;
            }
        }

        Ok(())
    }

    /// Parser → Aggregator → Emitter on a blocking thread, then publish
    async fn execute(&self, task_id: &TaskId) -> OrchestratorResult<PathBuf> {
        let file_system = self.file_system.clone();
        let blocking_id = task_id.clone();
        let batch_size = self.batch_size;

        let summary = tokio::task::spawn_blocking(move || {
            let input = file_system.open_input(&blocking_id)?;
            let output = file_system.create_staging_output(&blocking_id)?;
            aggregate_csv(input, output, batch_size)
        })
        .await
        .map_err(|e| OrchestratorError::WorkerAborted { message: e.to_string() })??;

        process_info!(
            ProcessId::current(),
            "📊 Task {}: {} rows, {} keys, {} batches in {}ms",
            task_id,
            summary.rows_read,
            summary.distinct_keys,
            summary.batches_written,
            summary.elapsed_ms
        );

        self.file_system.publish_output(task_id).await
    }
}

/// Task orchestrator with an injected storage service
pub struct Orchestrator<F>
where
    F: FileSystem + 'static,
{
    /// Injected storage service
    file_system: Arc<F>,

    /// Lifecycle state shared with workers
    registry: Arc<TaskRegistry>,

    /// Work queue; `None` once shutdown started
    queue: Mutex<Option<mpsc::UnboundedSender<TaskId>>>,

    /// Background worker handles
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<F> Orchestrator<F>
where
    F: FileSystem + 'static,
{
    /// Create the orchestrator and spawn its worker pool
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(file_system: F, config: &PipelineConfig) -> OrchestratorResult<Self> {
        config.validate()?;

        let file_system = Arc::new(file_system);
        let registry = Arc::new(TaskRegistry::new());
        let (tx, rx) = mpsc::unbounded_channel::<TaskId>();
        let rx = Arc::new(Mutex::new(rx));

        let runner = Arc::new(PipelineRunner {
            file_system: file_system.clone(),
            registry: registry.clone(),
            batch_size: config.batch_size,
        });

        let workers = (0..config.workers)
            .map(|worker_id| tokio::spawn(worker_loop(worker_id, runner.clone(), rx.clone())))
            .collect();

        process_debug!(
            ProcessId::current(),
            "🏭 Started {} pipeline workers (batch size {})",
            config.workers,
            config.batch_size
        );

        Ok(Self {
            file_system,
            registry,
            queue: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        })
    }

    /// Persist an upload and schedule its aggregation
    ///
    /// Returns as soon as the input is stored and the task is queued. When
    /// any step fails no task is left in the registry and the stored input
    /// is removed.
    pub async fn submit(&self, body: ByteStream) -> OrchestratorResult<TaskId> {
        let task_id = TaskId::new();

        let stored = match self.file_system.store_input(&task_id, body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.discard_input(&task_id).await;
                logging::log_error(ProcessId::current(), "Storing upload", &e);
                return Err(e);
            }
        };

        // held until the id is queued so shutdown cannot close the queue in between
        let queue = self.queue.lock().await;
        let Some(tx) = queue.as_ref().filter(|tx| !tx.is_closed()) else {
            self.discard_input(&task_id).await;
            process_warn!(ProcessId::current(), "⚠️ Rejected upload {}: service is shutting down", task_id);
            return Err(OrchestratorError::QueueClosed);
        };

        if let Err(e) = self.registry.register(task_id.clone()).await {
            self.discard_input(&task_id).await;
            return Err(e);
        }

        if tx.send(task_id.clone()).is_err() {
            if let Err(e) = self.registry.withdraw(&task_id).await {
                process_error!(ProcessId::current(), "❌ Could not withdraw unqueued task {}: {}", task_id, e);
            }
            self.discard_input(&task_id).await;
            return Err(OrchestratorError::QueueClosed);
        }
        drop(queue);

        process_info!(ProcessId::current(), "📥 Task {} accepted ({} bytes)", task_id, stored);
        Ok(task_id)
    }

    /// Submit an in-memory body
    pub async fn submit_bytes(&self, body: impl Into<Bytes>) -> OrchestratorResult<TaskId> {
        let chunk: Bytes = body.into();
        let stream: ByteStream = Box::pin(futures_util::stream::once(async move { Ok(chunk) }));
        self.submit(stream).await
    }

    /// Current outcome for a task; never waits for completion
    pub async fn result(&self, task_id: &TaskId) -> TaskOutcome {
        match self.registry.lookup(task_id).await {
            Some(task) => task.outcome(),
            None => TaskOutcome::NotFound,
        }
    }

    /// Per-state task counts
    pub async fn task_counts(&self) -> TaskCounts {
        self.registry.counts().await
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Stop accepting work and wait for queued tasks to drain
    ///
    /// Tasks already queued or running still finish; there is no
    /// cancellation.
    pub async fn shutdown(&self) {
        self.queue.lock().await.take();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                logging::log_error(ProcessId::current(), "Joining pipeline worker", &e);
            }
        }

        logging::log_shutdown(ProcessId::current(), "pipeline workers drained");
    }

    async fn discard_input(&self, task_id: &TaskId) {
        if let Err(cleanup) = self.file_system.discard_input(task_id).await {
            process_warn!(ProcessId::current(), "⚠️ Could not remove stored input for {}: {}", task_id, cleanup);
        }
    }
}

/// Pull task ids off the shared queue until it closes
async fn worker_loop<F>(
    worker_id: usize,
    runner: Arc<PipelineRunner<F>>,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<TaskId>>>,
) where
    F: FileSystem + 'static,
{
    loop {
        let next = queue.lock().await.recv().await;
        let Some(task_id) = next else {
            break;
        };

        process_debug!(ProcessId::current(), "👷 Worker {} picked up task {}", worker_id, task_id);
        if let Err(e) = runner.run(&task_id).await {
            // invariant violation; the task's own state is left as the registry has it
            process_error!(ProcessId::current(), "❌ Worker {} could not record task {}: {}", worker_id, task_id, e);
        }
    }

    process_debug!(ProcessId::current(), "👷 Worker {} stopped", worker_id);
}
