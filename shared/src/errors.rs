//! Shared error types for the aggregation service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid task id: {input}")]
    InvalidTaskId { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
