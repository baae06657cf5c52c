//! Parser → Aggregator → Emitter as one blocking unit of work

use std::io::{Read, Write};
use std::time::Instant;

use serde::Serialize;
use shared::{ProcessId, process_debug};

use crate::core::aggregator::Aggregator;
use crate::core::emitter::BatchEmitter;
use crate::core::parser::RecordParser;
use crate::error::OrchestratorResult;

/// Counters describing one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub rows_read: u64,
    pub distinct_keys: u64,
    pub entries_written: u64,
    pub batches_written: u64,
    pub elapsed_ms: u64,
}

/// Aggregate a CSV stream into sorted per-(entity, date) totals
///
/// Fails on the first malformed row. Nothing is written to `output` until
/// the whole input has been consumed, so a parse failure leaves the sink
/// untouched.
pub fn aggregate_csv<R, W>(input: R, output: W, batch_size: usize) -> OrchestratorResult<PipelineSummary>
where
    R: Read,
    W: Write,
{
    let started = Instant::now();

    // validate batch size before touching the input
    let mut emitter = BatchEmitter::new(output, batch_size)?;

    let mut aggregator = Aggregator::new();
    aggregator.consume(RecordParser::new(input))?;

    let rows_read = aggregator.rows_consumed();
    let distinct_keys = aggregator.distinct_keys() as u64;
    process_debug!(
        ProcessId::current(),
        "📊 Aggregated {} rows into {} keys",
        rows_read,
        distinct_keys
    );

    let entries = aggregator.into_sorted();
    emitter.emit_all(&entries)?;
    let (_sink, emitted) = emitter.finish()?;

    Ok(PipelineSummary {
        rows_read,
        distinct_keys,
        entries_written: emitted.entries_written,
        batches_written: emitted.batches_written,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;

    #[test]
    fn test_reference_scenario() {
        let input = "Song,Date,Number of Plays\nA,20200101,3\nB,20200101,5\nA,20200101,2\nA,20200102,1\n";
        let mut output = Vec::new();

        let summary = aggregate_csv(input.as_bytes(), &mut output, 500).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "entity,date,total\nA,20200101,5\nA,20200102,1\nB,20200101,5\n"
        );
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.distinct_keys, 3);
        assert_eq!(summary.entries_written, 3);
        assert_eq!(summary.batches_written, 1);
    }

    #[test]
    fn test_malformed_row_writes_nothing() {
        let input = "h,h,h\nA,20200101,3\nB,20200101,five\n";
        let mut output = Vec::new();

        let err = aggregate_csv(input.as_bytes(), &mut output, 500).unwrap_err();

        assert!(matches!(err, OrchestratorError::MalformedRow { line: 3, .. }));
        assert!(output.is_empty());
    }

    #[test]
    fn test_header_only_input() {
        let mut output = Vec::new();
        let summary = aggregate_csv("entity,date,count\n".as_bytes(), &mut output, 10).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "entity,date,total\n");
        assert_eq!(summary.rows_read, 0);
    }

    #[test]
    fn test_output_has_no_duplicate_keys_and_is_strictly_ascending() {
        let mut input = String::from("h,h,h\n");
        for i in 0..2_000u32 {
            input.push_str(&format!("E{},D{},{}\n", (i * 7) % 13, (i * 3) % 5, i % 10));
        }
        let mut output = Vec::new();
        aggregate_csv(input.as_bytes(), &mut output, 7).unwrap();

        let text = String::from_utf8(output).unwrap();
        let keys: Vec<(String, String)> = text
            .lines()
            .skip(1)
            .map(|line| {
                let mut parts = line.split(',');
                (parts.next().unwrap().to_string(), parts.next().unwrap().to_string())
            })
            .collect();

        assert_eq!(keys.len(), 13 * 5);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
