//! WebServer-specific error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use orchestrator::OrchestratorError;
use serde_json::json;
use shared::{logging, ProcessId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebServerError {
    #[error("HTTP server failed to bind {address}: {source}")]
    BindFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Task processing error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl WebServerError {
    pub fn config(field: impl Into<String>) -> Self {
        WebServerError::ConfigurationError { field: field.into() }
    }

    pub fn invalid_request(details: impl Into<String>) -> Self {
        WebServerError::InvalidRequest { details: details.into() }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            WebServerError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            logging::log_error(ProcessId::current(), "Request", &self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type WebServerResult<T> = Result<T, WebServerError>;
