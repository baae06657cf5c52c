//! Webserver library for the aggregation service
//!
//! HTTP boundary over the task orchestrator: clients upload CSV bodies,
//! receive a task id immediately, and poll for the aggregated result.

pub mod error;
pub mod traits;
pub mod web;
pub mod webserver_impl;

// Re-export main types
pub use error::{WebServerError, WebServerResult};
pub use traits::{MockTaskService, TaskService};
pub use webserver_impl::WebServer;
