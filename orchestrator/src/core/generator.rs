//! Synthetic play-count datasets for load testing

use std::io::Write;

use chrono::{Duration, NaiveDate};
use csv::WriterBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Header written at the top of generated files
pub const INPUT_HEADER: [&str; 3] = ["entity", "date", "count"];

/// Random dataset shape
#[derive(Debug, Clone)]
pub struct DatasetGenerator {
    entities: Vec<String>,
    dates: Vec<String>,
    max_count: u64,
    seed: u64,
}

impl Default for DatasetGenerator {
    /// Four songs over every day of January 2020
    fn default() -> Self {
        Self {
            entities: ["Song A", "Song B", "Song C", "Song D"].iter().map(|s| s.to_string()).collect(),
            dates: Self::date_range("2020-01-01", 31).unwrap_or_default(),
            max_count: 1000,
            seed: 42,
        }
    }
}

impl DatasetGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_dates(mut self, dates: Vec<String>) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_max_count(mut self, max_count: u64) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Consecutive ISO dates starting at `start`
    pub fn date_range(start: &str, days: u32) -> OrchestratorResult<Vec<String>> {
        let first = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|e| OrchestratorError::config(format!("invalid start date {start:?}: {e}")))?;

        Ok((0..days)
            .map(|offset| (first + Duration::days(i64::from(offset))).format("%Y-%m-%d").to_string())
            .collect())
    }

    /// Number of distinct (entity, date) keys the dataset can contain
    pub fn key_space(&self) -> usize {
        self.entities.len() * self.dates.len()
    }

    /// Write a header plus `rows` random records to `sink`
    pub fn write_rows<W: Write>(&self, sink: W, rows: u64) -> OrchestratorResult<()> {
        if self.entities.is_empty() || self.dates.is_empty() {
            return Err(OrchestratorError::config("generator needs at least one entity and one date"));
        }
        if self.max_count == 0 {
            return Err(OrchestratorError::config("max_count must be at least 1"));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
        writer.write_record(INPUT_HEADER)?;

        for _ in 0..rows {
            let entity = &self.entities[rng.gen_range(0..self.entities.len())];
            let date = &self.dates[rng.gen_range(0..self.dates.len())];
            let count = rng.gen_range(1..=self.max_count).to_string();
            writer.write_record([entity.as_str(), date.as_str(), count.as_str()])?;
        }

        writer.flush()?;
        Ok(())
    }
}
