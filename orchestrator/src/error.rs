//! Orchestrator-specific error types

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Total for ({entity}, {date}) overflowed")]
    CountOverflow { entity: String, date: String },

    #[error("File system operation failed: {operation} on {path}: {source}")]
    FileSystemError {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Task {task_id} already registered")]
    DuplicateTask { task_id: String },

    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition { task_id: String, from: String, to: String },

    #[error("Task queue is closed")]
    QueueClosed,

    #[error("Pipeline worker aborted: {message}")]
    WorkerAborted { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        OrchestratorError::ConfigurationError { field: field.into() }
    }

    pub fn file_system(operation: &str, path: &std::path::Path, source: std::io::Error) -> Self {
        OrchestratorError::FileSystemError {
            operation: operation.to_string(),
            path: path.display().to_string(),
            source,
        }
    }

    /// Failure reason recorded on a task and shown to clients
    ///
    /// Same as `Display` except storage errors, which drop the server-side
    /// path.
    pub fn task_reason(&self) -> String {
        match self {
            OrchestratorError::FileSystemError { operation, source, .. } => {
                format!("Could not {operation} task file: {source}")
            }
            other => other.to_string(),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
