//! Hash aggregation of play counts by (entity, date)
//!
//! One `Aggregator` belongs to exactly one pipeline execution. Memory grows
//! with the number of distinct keys, never with the number of rows.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;

use crate::core::parser::Row;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Composite grouping key
///
/// Ordering compares `entity` first and `date` second, both byte-wise, which
/// is the order the output file is written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AggregationKey {
    pub entity: String,
    pub date: String,
}

impl AggregationKey {
    pub fn new(entity: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            date: date.into(),
        }
    }
}

/// Final (or running) sum for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationEntry {
    pub key: AggregationKey,
    pub total: u64,
}

impl AggregationEntry {
    pub fn new(entity: impl Into<String>, date: impl Into<String>, total: u64) -> Self {
        Self {
            key: AggregationKey::new(entity, date),
            total,
        }
    }
}

/// Running totals keyed by (entity, date)
#[derive(Debug, Default)]
pub struct Aggregator {
    totals: HashMap<AggregationKey, u64>,
    rows_consumed: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row to its key's running total
    pub fn add(&mut self, row: Row) -> OrchestratorResult<()> {
        let key = AggregationKey {
            entity: row.entity,
            date: row.date,
        };

        match self.totals.entry(key) {
            Entry::Occupied(mut entry) => {
                let sum = entry.get().checked_add(row.count).ok_or_else(|| OrchestratorError::CountOverflow {
                    entity: entry.key().entity.clone(),
                    date: entry.key().date.clone(),
                })?;
                *entry.get_mut() = sum;
            }
            Entry::Vacant(entry) => {
                entry.insert(row.count);
            }
        }

        self.rows_consumed += 1;
        Ok(())
    }

    /// Consume rows until the input ends or the first error
    pub fn consume<I>(&mut self, rows: I) -> OrchestratorResult<()>
    where
        I: IntoIterator<Item = OrchestratorResult<Row>>,
    {
        for row in rows {
            self.add(row?)?;
        }
        Ok(())
    }

    /// Current total for a key, if any row carried it
    pub fn total(&self, entity: &str, date: &str) -> Option<u64> {
        self.totals.get(&AggregationKey::new(entity, date)).copied()
    }

    /// Number of distinct keys seen so far
    pub fn distinct_keys(&self) -> usize {
        self.totals.len()
    }

    pub fn rows_consumed(&self) -> u64 {
        self.rows_consumed
    }

    /// Finish accumulation and hand back entries in ascending key order
    pub fn into_sorted(self) -> Vec<AggregationEntry> {
        let mut entries: Vec<AggregationEntry> = self
            .totals
            .into_iter()
            .map(|(key, total)| AggregationEntry { key, total })
            .collect();

        // keys are unique, so an unstable sort is still deterministic
        entries.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[(&str, &str, u64)]) -> Vec<OrchestratorResult<Row>> {
        data.iter().map(|(e, d, c)| Ok(Row::new(*e, *d, *c))).collect()
    }

    #[test]
    fn test_sums_counts_per_key() {
        let mut aggregator = Aggregator::new();
        aggregator
            .consume(rows(&[
                ("A", "20200101", 3),
                ("B", "20200101", 5),
                ("A", "20200101", 2),
                ("A", "20200102", 1),
            ]))
            .unwrap();

        assert_eq!(aggregator.total("A", "20200101"), Some(5));
        assert_eq!(aggregator.total("A", "20200102"), Some(1));
        assert_eq!(aggregator.total("B", "20200101"), Some(5));
        assert_eq!(aggregator.total("B", "20200102"), None);
        assert_eq!(aggregator.distinct_keys(), 3);
        assert_eq!(aggregator.rows_consumed(), 4);
    }

    #[test]
    fn test_into_sorted_orders_entity_then_date() {
        let mut aggregator = Aggregator::new();
        aggregator
            .consume(rows(&[
                ("B", "20200101", 5),
                ("A", "20200102", 1),
                ("A", "20200101", 3),
                ("A", "20200101", 2),
            ]))
            .unwrap();

        assert_eq!(
            aggregator.into_sorted(),
            vec![
                AggregationEntry::new("A", "20200101", 5),
                AggregationEntry::new("A", "20200102", 1),
                AggregationEntry::new("B", "20200101", 5),
            ]
        );
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let mut aggregator = Aggregator::new();
        aggregator
            .consume(rows(&[("b", "d", 1), ("B", "d", 1), ("a", "d", 1), ("Ab", "d", 1), ("A", "d", 1)]))
            .unwrap();

        let order: Vec<String> = aggregator.into_sorted().into_iter().map(|e| e.key.entity).collect();
        assert_eq!(order, vec!["A", "Ab", "B", "a", "b"]);
    }

    #[test]
    fn test_zero_counts_still_create_entries() {
        let mut aggregator = Aggregator::new();
        aggregator.consume(rows(&[("A", "d", 0)])).unwrap();
        assert_eq!(aggregator.total("A", "d"), Some(0));
    }

    #[test]
    fn test_stops_at_first_error() {
        let mut aggregator = Aggregator::new();
        let input = vec![
            Ok(Row::new("A", "d", 1)),
            Err(OrchestratorError::MalformedRow {
                line: 3,
                reason: "bad".to_string(),
            }),
            Ok(Row::new("A", "d", 1)),
        ];

        let err = aggregator.consume(input).unwrap_err();
        assert!(matches!(err, OrchestratorError::MalformedRow { line: 3, .. }));
        assert_eq!(aggregator.total("A", "d"), Some(1));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut aggregator = Aggregator::new();
        aggregator.add(Row::new("A", "d", u64::MAX)).unwrap();
        let err = aggregator.add(Row::new("A", "d", 1)).unwrap_err();
        match err {
            OrchestratorError::CountOverflow { entity, date } => {
                assert_eq!(entity, "A");
                assert_eq!(date, "d");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_memory_tracks_distinct_keys_not_rows() {
        let mut aggregator = Aggregator::new();
        for i in 0..10_000u64 {
            let entity = format!("Song {}", i % 4);
            let date = format!("2020-01-{:02}", (i % 31) + 1);
            aggregator.add(Row::new(entity, date, 1)).unwrap();
        }
        assert_eq!(aggregator.rows_consumed(), 10_000);
        assert_eq!(aggregator.distinct_keys(), 124);
    }
}
