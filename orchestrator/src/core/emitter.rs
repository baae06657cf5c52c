//! Sorted, batched output writer
//!
//! Writes the header once, then the aggregated entries in fixed-size batches,
//! flushing the sink after every batch so encoded output never piles up in
//! memory.

use std::io::Write;

use csv::{Writer, WriterBuilder};
use shared::{ProcessId, process_debug};

use crate::core::aggregator::AggregationEntry;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Column names of the published output
pub const OUTPUT_HEADER: [&str; 3] = ["entity", "date", "total"];

/// Default number of entries per batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// What the emitter wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub entries_written: u64,
    pub batches_written: u64,
}

/// Batched CSV writer for aggregation entries
pub struct BatchEmitter<W: Write> {
    writer: Writer<W>,
    batch_size: usize,
    header_written: bool,
    summary: EmitSummary,
}

impl<W: Write> BatchEmitter<W> {
    pub fn new(sink: W, batch_size: usize) -> OrchestratorResult<Self> {
        if batch_size == 0 {
            return Err(OrchestratorError::config("batch_size must be at least 1"));
        }

        Ok(Self {
            writer: WriterBuilder::new().has_headers(false).from_writer(sink),
            batch_size,
            header_written: false,
            summary: EmitSummary::default(),
        })
    }

    fn ensure_header(&mut self) -> OrchestratorResult<()> {
        if !self.header_written {
            self.writer.write_record(OUTPUT_HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Write one batch and flush it to the sink
    pub fn write_batch(&mut self, batch: &[AggregationEntry]) -> OrchestratorResult<()> {
        self.ensure_header()?;

        for entry in batch {
            let total = entry.total.to_string();
            self.writer
                .write_record([entry.key.entity.as_str(), entry.key.date.as_str(), total.as_str()])?;
        }
        self.writer.flush()?;

        self.summary.entries_written += batch.len() as u64;
        self.summary.batches_written += 1;

        process_debug!(
            ProcessId::current(),
            "📝 Wrote batch {} ({} entries so far)",
            self.summary.batches_written,
            self.summary.entries_written
        );
        Ok(())
    }

    /// Write every entry in `batch_size` chunks, preserving order
    ///
    /// Entries must already be sorted; see `Aggregator::into_sorted`.
    pub fn emit_all(&mut self, entries: &[AggregationEntry]) -> OrchestratorResult<()> {
        for batch in entries.chunks(self.batch_size) {
            self.write_batch(batch)?;
        }
        Ok(())
    }

    /// Write the header if nothing was written, flush, and return the sink
    pub fn finish(mut self) -> OrchestratorResult<(W, EmitSummary)> {
        self.ensure_header()?;
        self.writer.flush()?;

        let summary = self.summary;
        let sink = self.writer.into_inner().map_err(|e| OrchestratorError::IoError(e.into_error()))?;
        Ok((sink, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<AggregationEntry> {
        (0..n)
            .map(|i| AggregationEntry::new(format!("Song {i:03}"), "2020-01-01", i as u64))
            .collect()
    }

    #[test]
    fn test_header_written_once_before_entries() {
        let mut emitter = BatchEmitter::new(Vec::new(), 2).unwrap();
        emitter.emit_all(&entries(5)).unwrap();
        let (sink, summary) = emitter.finish().unwrap();

        let text = String::from_utf8(sink).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "entity,date,total");
        assert_eq!(lines.len(), 6);
        assert_eq!(text.matches("entity,date,total").count(), 1);
        assert_eq!(summary.entries_written, 5);
        assert_eq!(summary.batches_written, 3);
    }

    #[test]
    fn test_empty_output_still_has_header() {
        let emitter = BatchEmitter::new(Vec::new(), DEFAULT_BATCH_SIZE).unwrap();
        let (sink, summary) = emitter.finish().unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "entity,date,total\n");
        assert_eq!(summary.batches_written, 0);
    }

    #[test]
    fn test_batches_preserve_order() {
        let input = entries(1234);
        let mut emitter = BatchEmitter::new(Vec::new(), DEFAULT_BATCH_SIZE).unwrap();
        emitter.emit_all(&input).unwrap();
        let (sink, summary) = emitter.finish().unwrap();

        assert_eq!(summary.batches_written, 3);
        let text = String::from_utf8(sink).unwrap();
        let written: Vec<&str> = text.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
        let expected: Vec<String> = input.iter().map(|e| e.key.entity.clone()).collect();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        let mut emitter = BatchEmitter::new(Vec::new(), 10).unwrap();
        emitter
            .write_batch(&[AggregationEntry::new("Song, Part 2", "2020-01-01", 9)])
            .unwrap();
        let (sink, _) = emitter.finish().unwrap();
        assert!(String::from_utf8(sink).unwrap().contains("\"Song, Part 2\",2020-01-01,9"));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        assert!(BatchEmitter::new(Vec::new(), 0).is_err());
    }

    /// Sink that counts flushes and fails after a limit
    struct FlakySink {
        flushes: usize,
        fail_after: usize,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            if self.flushes > self.fail_after {
                return Err(std::io::Error::other("disk full"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_surfaces_as_error() {
        let sink = FlakySink { flushes: 0, fail_after: 1 };
        let mut emitter = BatchEmitter::new(sink, 1).unwrap();
        let result = emitter.emit_all(&entries(3));
        assert!(result.is_err());
    }
}
