//! Shared types for the play-count aggregation service
//!
//! Contains the identifiers and task outcome messages exchanged between the
//! orchestrator library and the HTTP boundary, plus common logging setup.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export task lifecycle messages
pub use messages::{TaskCounts, TaskOutcome};
