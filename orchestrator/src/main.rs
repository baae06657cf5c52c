//! Main entry point for the orchestrator binary
//!
//! Offline companion to the webserver: runs the aggregation pipeline on a
//! local file, or generates synthetic input datasets for load testing.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use orchestrator::core::DEFAULT_BATCH_SIZE;
use orchestrator::{aggregate_csv, DatasetGenerator};
use shared::{logging, process_debug, process_info, process_warn, ProcessId};

/// Aggregates (entity, date, count) CSV files into per-day totals
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Aggregates play-count CSV files into per-entity daily totals")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PLAYTALLY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Aggregate a local CSV file
    Aggregate {
        /// Input CSV with header `entity,date,count`
        #[arg(long)]
        input: PathBuf,

        /// Output CSV with header `entity,date,total`
        #[arg(long)]
        output: PathBuf,

        /// Entries written per output batch
        #[arg(long, env = "PLAYTALLY_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Write a synthetic input dataset
    Generate {
        /// Number of data rows
        #[arg(long)]
        rows: u64,

        /// Destination CSV file
        #[arg(long)]
        output: PathBuf,

        /// Seed for reproducible datasets
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    ProcessId::init_orchestrator();
    logging::init_tracing_with_level(Some(&args.log_level));

    match args.command {
        Command::Aggregate { input, output, batch_size } => run_aggregate(&input, &output, batch_size),
        Command::Generate { rows, output, seed } => run_generate(rows, &output, seed),
    }
}

fn run_aggregate(input: &Path, output: &Path, batch_size: usize) -> anyhow::Result<()> {
    logging::log_startup(ProcessId::current(), &format!("aggregation of {}", input.display()));
    logging::log_progress(ProcessId::current(), "Batch size", &batch_size.to_string());

    let reader = File::open(input).with_context(|| format!("opening {}", input.display()))?;

    // write next to the destination and rename, so a failed run leaves no output
    let mut staging = output.as_os_str().to_owned();
    staging.push(".partial");
    let staging = PathBuf::from(staging);
    let writer = File::create(&staging).with_context(|| format!("creating {}", staging.display()))?;

    let summary = match aggregate_csv(BufReader::new(reader), BufWriter::new(writer), batch_size) {
        Ok(summary) => summary,
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                process_warn!(
                    ProcessId::current(),
                    "⚠️ Could not remove {}: {}",
                    staging.display(),
                    cleanup
                );
            }
            logging::log_error(ProcessId::current(), "Aggregation", &e);
            return Err(e.into());
        }
    };

    std::fs::rename(&staging, output).with_context(|| format!("publishing {}", output.display()))?;

    process_debug!(ProcessId::current(), "Wrote {}", output.display());
    logging::log_success(
        ProcessId::current(),
        &format!("{} rows folded into {} totals", summary.rows_read, summary.entries_written),
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_generate(rows: u64, output: &Path, seed: Option<u64>) -> anyhow::Result<()> {
    let mut generator = DatasetGenerator::new();
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }

    process_info!(
        ProcessId::current(),
        "🎲 Generating {} rows over {} keys into {}",
        rows,
        generator.key_space(),
        output.display()
    );

    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    generator.write_rows(BufWriter::new(file), rows)?;

    logging::log_success(ProcessId::current(), &format!("Generated {} rows", rows));
    Ok(())
}
