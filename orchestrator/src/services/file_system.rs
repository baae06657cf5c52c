//! Real file system service implementation
//!
//! Stores raw uploads and aggregation outputs under one data directory. File
//! names are built from the task id only: `<id>_input.csv`,
//! `<id>_output.csv.partial` while a pipeline is writing, and
//! `<id>_output.csv` once published.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use shared::{ProcessId, TaskId, process_debug};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ByteStream, FileSystem};

/// Real file system implementation
pub struct RealFileSystem {
    /// Base directory for inputs and outputs
    base_dir: PathBuf,
}

impl RealFileSystem {
    /// Create new file system service (stores under ./uploads)
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("./uploads"),
        }
    }

    /// Create with custom base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Make sure the data directory exists
    pub async fn ensure_base_dir(&self) -> OrchestratorResult<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| OrchestratorError::file_system("create directory", &self.base_dir, e))
    }

    pub fn input_path(&self, task_id: &TaskId) -> PathBuf {
        self.base_dir.join(format!("{task_id}_input.csv"))
    }

    pub fn staging_path(&self, task_id: &TaskId) -> PathBuf {
        self.base_dir.join(format!("{task_id}_output.csv.partial"))
    }

    pub fn output_path(&self, task_id: &TaskId) -> PathBuf {
        self.base_dir.join(format!("{task_id}_output.csv"))
    }

    /// Remove a file, treating "already gone" as success
    async fn remove_if_exists(path: &Path) -> OrchestratorResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OrchestratorError::file_system("remove", path, e)),
        }
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn store_input(&self, task_id: &TaskId, mut body: ByteStream) -> OrchestratorResult<u64> {
        self.ensure_base_dir().await?;

        let path = self.input_path(task_id);
        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| OrchestratorError::file_system("create", &path, e))?;

        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| OrchestratorError::file_system("receive upload for", &path, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| OrchestratorError::file_system("write", &path, e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| OrchestratorError::file_system("flush", &path, e))?;

        process_debug!(ProcessId::current(), "💾 Stored {} bytes of input at {}", written, path.display());
        Ok(written)
    }

    async fn discard_input(&self, task_id: &TaskId) -> OrchestratorResult<()> {
        Self::remove_if_exists(&self.input_path(task_id)).await
    }

    fn open_input(&self, task_id: &TaskId) -> OrchestratorResult<Box<dyn Read + Send>> {
        let path = self.input_path(task_id);
        let file = std::fs::File::open(&path).map_err(|e| OrchestratorError::file_system("open", &path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create_staging_output(&self, task_id: &TaskId) -> OrchestratorResult<Box<dyn Write + Send>> {
        let path = self.staging_path(task_id);
        let file = std::fs::File::create(&path).map_err(|e| OrchestratorError::file_system("create", &path, e))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    async fn publish_output(&self, task_id: &TaskId) -> OrchestratorResult<PathBuf> {
        let staging = self.staging_path(task_id);
        let output = self.output_path(task_id);

        // rename within one directory is atomic, readers never see a half file
        fs::rename(&staging, &output)
            .await
            .map_err(|e| OrchestratorError::file_system("publish", &staging, e))?;

        process_debug!(ProcessId::current(), "📦 Published output {}", output.display());
        Ok(output)
    }

    async fn discard_output(&self, task_id: &TaskId) -> OrchestratorResult<()> {
        Self::remove_if_exists(&self.staging_path(task_id)).await
    }
}
