//! Trait definitions with mockall annotations for testing
//!
//! Storage is the only I/O seam of the orchestrator. Everything that touches
//! the disk goes through `FileSystem`, so the task lifecycle can be tested
//! with in-memory readers and writers and injected failures.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use shared::TaskId;

use crate::error::OrchestratorResult;

/// Raw upload body as a stream of chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// File storage abstraction for dependency injection
///
/// Every location is derived from the task id alone. The published output
/// only appears once `publish_output` succeeds; until then the pipeline
/// writes to a staging location that is never handed to callers.
#[mockall::automock]
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Persist the raw upload for a task
    ///
    /// # Returns
    /// Number of bytes stored
    async fn store_input(&self, task_id: &TaskId, body: ByteStream) -> OrchestratorResult<u64>;

    /// Remove a stored (possibly partial) upload
    async fn discard_input(&self, task_id: &TaskId) -> OrchestratorResult<()>;

    /// Open the stored upload for blocking reads
    fn open_input(&self, task_id: &TaskId) -> OrchestratorResult<Box<dyn Read + Send>>;

    /// Create the staging output for blocking writes
    fn create_staging_output(&self, task_id: &TaskId) -> OrchestratorResult<Box<dyn Write + Send>>;

    /// Move the staging output to its published location
    ///
    /// # Returns
    /// The published output location
    async fn publish_output(&self, task_id: &TaskId) -> OrchestratorResult<PathBuf>;

    /// Remove the staging output, if any
    async fn discard_output(&self, task_id: &TaskId) -> OrchestratorResult<()>;
}
