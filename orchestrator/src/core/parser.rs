//! Record parser for delimited play-count input
//!
//! Turns a raw byte stream into a lazy sequence of typed rows. The first
//! record is a header and is skipped without looking at it. Every following
//! record must have exactly three fields: entity, date and a non-negative
//! integer count.

use std::collections::VecDeque;
use std::io::{self, Read};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Number of fields every data record must carry
pub const FIELD_COUNT: usize = 3;

/// One parsed input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub entity: String,
    pub date: String,
    pub count: u64,
}

impl Row {
    pub fn new(entity: impl Into<String>, date: impl Into<String>, count: u64) -> Self {
        Self {
            entity: entity.into(),
            date: date.into(),
            count,
        }
    }
}

/// Reader that remembers where newlines are in the bytes handed to csv
///
/// Only offsets not yet passed by the parser are kept, so memory is bounded
/// by the csv read-ahead buffer.
struct LineTrackingReader<R> {
    inner: R,
    consumed: u64,
    newlines: VecDeque<u64>,
}

impl<R: Read> Read for LineTrackingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for (i, byte) in buf[..n].iter().enumerate() {
            if *byte == b'\n' {
                self.newlines.push_back(self.consumed + i as u64);
            }
        }
        self.consumed += n as u64;
        Ok(n)
    }
}

/// Lazy row iterator over any reader
///
/// Yields `Err` for the first malformed record. Callers are expected to stop
/// consuming at that point; the aggregation pipeline fails the whole task.
pub struct RecordParser<R: Read> {
    records: StringRecordsIntoIter<LineTrackingReader<R>>,
    newlines_passed: u64,
}

impl<R: Read> RecordParser<R> {
    pub fn new(input: R) -> Self {
        let tracked = LineTrackingReader {
            inner: input,
            consumed: 0,
            newlines: VecDeque::new(),
        };

        // flexible: the header is never validated, field counts are checked per row
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(tracked);

        Self {
            records: reader.into_records(),
            newlines_passed: 0,
        }
    }

    /// 1-based line of the record just read
    ///
    /// The reader position sits right after the record's terminator (or
    /// part of it for CRLF), so every newline before the record's last byte
    /// belongs to an earlier line. Blank lines are counted like any other.
    fn current_line(&mut self) -> u64 {
        let last_byte = self.records.reader().position().byte().saturating_sub(1);
        let tracked = self.records.reader_mut().get_mut();

        while let Some(&offset) = tracked.newlines.front() {
            if offset >= last_byte {
                break;
            }
            tracked.newlines.pop_front();
            self.newlines_passed += 1;
        }

        self.newlines_passed + 1
    }
}

impl<R: Read> Iterator for RecordParser<R> {
    type Item = OrchestratorResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let line = self.current_line();
        Some(match record {
            Ok(record) => parse_record(&record, line),
            Err(e) => Err(map_csv_error(e, line)),
        })
    }
}

/// Convert one data record into a typed row
fn parse_record(record: &StringRecord, line: u64) -> OrchestratorResult<Row> {
    if record.len() != FIELD_COUNT {
        return Err(OrchestratorError::MalformedRow {
            line,
            reason: format!("expected {} fields, found {}", FIELD_COUNT, record.len()),
        });
    }

    let raw_count = &record[2];
    let count = raw_count.trim().parse::<u64>().map_err(|_| OrchestratorError::MalformedRow {
        line,
        reason: format!("count {raw_count:?} is not a non-negative integer"),
    })?;

    Ok(Row {
        entity: record[0].to_string(),
        date: record[1].to_string(),
        count,
    })
}

fn map_csv_error(err: csv::Error, line: u64) -> OrchestratorError {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => OrchestratorError::MalformedRow {
            line,
            reason: "record is not valid UTF-8".to_string(),
        },
        _ => OrchestratorError::CsvError(err),
    }
}
