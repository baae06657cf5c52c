//! Pipeline configuration
//!
//! Shared by the orchestrator CLI and the webserver binary through
//! `#[command(flatten)]`; every flag can also come from the environment.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};
use shared::SharedError;

use crate::core::DEFAULT_BATCH_SIZE;
use crate::error::OrchestratorResult;

/// Default number of background pipeline workers
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory for raw uploads and aggregation outputs
    #[arg(long, env = "PLAYTALLY_DATA_DIR", default_value = "./uploads")]
    pub data_dir: PathBuf,

    /// Number of background pipeline workers
    #[arg(long, env = "PLAYTALLY_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Entries written per output batch
    #[arg(long, env = "PLAYTALLY_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./uploads"),
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.workers == 0 {
            return Err(SharedError::InvalidConfig {
                field: "workers".to_string(),
                value: self.workers.to_string(),
            }
            .into());
        }
        if self.batch_size == 0 {
            return Err(SharedError::InvalidConfig {
                field: "batch_size".to_string(),
                value: self.batch_size.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
