//! Command-line surface that supplies run parameters and config overrides.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{Config, FailurePolicy};
use crate::protocol::{RowRange, RunParameters};
use crate::record_io::default_quarantine_path;

/// Append a genre/category column to a list of books keyed by ISBN.
#[derive(Debug, Parser)]
#[command(name = "genre-enricher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Delimited input file; the first field of every row is the ISBN.
    pub source: PathBuf,

    /// Output file.
    #[arg(short, long, default_value = "genre.csv")]
    pub output: PathBuf,

    /// First row to enrich (zero-based, inclusive).
    #[arg(long)]
    pub start: usize,

    /// Row to stop at (zero-based, exclusive).
    #[arg(long)]
    pub end: usize,

    /// Config file. Defaults to the user config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// What to do with rows whose lookups keep failing.
    #[arg(long, value_enum)]
    pub failure_policy: Option<FailurePolicy>,

    /// Quarantine file for `--failure-policy quarantine`.
    #[arg(long)]
    pub quarantine: Option<PathBuf>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Successful rows between checkpoint flushes.
    #[arg(long)]
    pub checkpoint_interval: Option<usize>,

    /// Field delimiter for input and output.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Google Books API key.
    #[arg(long, env = "GOOGLE_BOOKS_API_KEY")]
    pub api_key: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parsed `--log-level`, falling back to `info` for unknown names.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    /// Applies command-line overrides on top of file config.
    pub fn apply_overrides(&self, config: Config) -> Config {
        let mut merged = config;
        if let Some(policy) = self.failure_policy {
            merged.batch.failure_policy = policy;
        }
        if let Some(max_attempts) = self.max_attempts {
            merged.retry.max_attempts = max_attempts;
        }
        if let Some(retry_delay_ms) = self.retry_delay_ms {
            merged.retry.retry_delay_ms = retry_delay_ms;
        }
        if let Some(checkpoint_interval) = self.checkpoint_interval {
            merged.batch.checkpoint_interval = checkpoint_interval;
        }
        if let Some(delimiter) = self.delimiter {
            merged.batch.delimiter = delimiter;
        }
        if let Some(api_key) = &self.api_key {
            merged.lookup.api_key = api_key.clone();
        }
        merged
    }

    /// Builds run parameters for the effective failure policy.
    ///
    /// Fails when the quarantine file would be the output file, since both are
    /// truncated and written at the same time.
    pub fn run_parameters(&self, failure_policy: FailurePolicy) -> Result<RunParameters, String> {
        let quarantine_path = (failure_policy == FailurePolicy::Quarantine).then(|| {
            self.quarantine
                .clone()
                .unwrap_or_else(|| default_quarantine_path(&self.output))
        });
        if let Some(path) = &quarantine_path {
            if same_file_path(path, &self.output) {
                return Err(format!(
                    "quarantine file must differ from the output file: {}",
                    path.display()
                ));
            }
        }
        Ok(RunParameters {
            source_path: self.source.clone(),
            dest_path: self.output.clone(),
            range: RowRange::new(self.start, self.end),
            quarantine_path,
        })
    }
}

/// Compares two paths after resolving them against the working directory.
fn same_file_path(left: &Path, right: &Path) -> bool {
    let resolve = |path: &Path| {
        std::path::absolute(path)
            .map(|absolute| absolute.components().collect::<PathBuf>())
            .unwrap_or_else(|_| path.to_path_buf())
    };
    resolve(left) == resolve(right)
}
