//! Orchestrator library for asynchronous CSV aggregation tasks
//!
//! Uploads of `entity,date,count` rows are persisted, queued, and folded
//! into per-(entity, date) totals by a pool of background workers. Callers
//! poll by task id until the task completes or fails.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use crate::core::{aggregate_csv, DatasetGenerator, PipelineSummary, TaskRegistry, TaskStatus};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use services::RealFileSystem;
pub use traits::{ByteStream, FileSystem, MockFileSystem};
