//! Messages exchanged between the orchestrator and the HTTP boundary

pub mod task;

pub use task::{TaskCounts, TaskOutcome};
