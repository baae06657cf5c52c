//! Core aggregation logic
//!
//! Pure business logic: parsing, aggregation, ordering and batched output
//! work on plain `Read`/`Write` values and are easily testable. The task
//! registry is the lifecycle state machine shared with the HTTP boundary.

pub mod aggregator;
pub mod emitter;
pub mod generator;
pub mod parser;
pub mod pipeline;
pub mod registry;

pub use aggregator::{AggregationEntry, AggregationKey, Aggregator};
pub use emitter::{BatchEmitter, DEFAULT_BATCH_SIZE, EmitSummary, OUTPUT_HEADER};
pub use generator::DatasetGenerator;
pub use parser::{RecordParser, Row};
pub use pipeline::{PipelineSummary, aggregate_csv};
pub use registry::{Task, TaskRegistry, TaskStatus};
