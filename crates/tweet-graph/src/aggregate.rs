//! Aggregation cache - replays archived pages into cumulative table snapshots.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::normalize::{normalize, TableCounts, Tables};
use crate::storage::{list_pages, read_page, TableSink};

/// Files between two snapshots unless configured otherwise.
pub const DEFAULT_AGG_INTERVAL: usize = 1000;

/// Snapshot table names, in write order.
pub const TWEETS_TABLE: &str = "tweets";
pub const USERS_TABLE: &str = "users";
pub const MEDIA_TABLE: &str = "media";
pub const REFERENCED_TABLE: &str = "referenced_tweets";
pub const EDGES_TABLE: &str = "interactions";

/// Configuration for a replay run.
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Directory of archived raw pages.
    pub input_dir: PathBuf,
    /// Snapshot every this many files (and after the last one).
    pub agg_interval: usize,
}

impl AggregateConfig {
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            agg_interval: DEFAULT_AGG_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, agg_interval: usize) -> Self {
        self.agg_interval = agg_interval;
        self
    }
}

/// One snapshot attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushEvent {
    /// 1-based file index the snapshot is named after.
    pub index: usize,
    /// Rows per table at flush time.
    pub counts: TableCounts,
    /// Why the snapshot failed, if it did.
    pub error: Option<String>,
}

impl FlushEvent {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a replay run.
#[derive(Debug, Default)]
pub struct AggregateReport {
    /// Files found in the input directory.
    pub files: usize,
    /// Files decoded and normalized.
    pub loaded: usize,
    /// Files that could not be read or decoded.
    pub not_loaded: Vec<PathBuf>,
    /// Snapshot attempts in order.
    pub flushes: Vec<FlushEvent>,
    /// Absent page sections replaced by empty tables.
    pub missing_sections: usize,
    /// Items dropped because they could not be decoded.
    pub skipped_items: usize,
}

/// Final tables plus the run report.
#[derive(Debug)]
pub struct Aggregated {
    pub tables: Tables,
    pub report: AggregateReport,
}

/// Replays a page archive through the normalizer.
pub struct Aggregator<S> {
    config: AggregateConfig,
    sink: S,
}

impl<S: TableSink> Aggregator<S> {
    pub fn new(config: AggregateConfig, sink: S) -> Result<Self> {
        if config.agg_interval == 0 {
            return Err(Error::Config("agg_interval must be at least 1".to_string()));
        }
        Ok(Self { config, sink })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Replay every page in the input directory, in file-name order.
    ///
    /// Snapshots are cumulative: the accumulator is never reset, so a later
    /// snapshot is a superset of every earlier one.
    pub fn run(&self) -> Result<Aggregated> {
        let paths = list_pages(&self.config.input_dir)?;
        let mut report = AggregateReport {
            files: paths.len(),
            ..Default::default()
        };

        tracing::info!(
            input = %self.config.input_dir.display(),
            files = paths.len(),
            interval = self.config.agg_interval,
            "Starting aggregation"
        );

        let mut tables = Tables::new();
        for (n, path) in paths.iter().enumerate() {
            let index = n + 1;
            tables = replay_file(tables, path, &mut report);

            if index % self.config.agg_interval == 0 || index == paths.len() {
                self.flush(&tables, index, &mut report);
            }
        }

        tracing::info!(
            files = report.files,
            loaded = report.loaded,
            not_loaded = report.not_loaded.len(),
            flushes = report.flushes.len(),
            "Aggregation complete"
        );

        Ok(Aggregated { tables, report })
    }

    /// Write a cumulative snapshot of every table. Failures are recorded, not raised.
    fn flush(&self, tables: &Tables, index: usize, report: &mut AggregateReport) {
        let counts = tables.counts();
        let error = write_snapshot(&self.sink, tables, index).err().map(|e| {
            tracing::warn!(index, error = %e, "Snapshot failed, keeping accumulated tables");
            e.to_string()
        });
        if error.is_none() {
            tracing::info!(
                index,
                tweets = counts.tweets,
                users = counts.users,
                media = counts.media,
                referenced = counts.referenced,
                edges = counts.edges,
                "Wrote snapshot"
            );
        }
        report.flushes.push(FlushEvent {
            index,
            counts,
            error,
        });
    }
}

/// Normalize one archived page into `tables`.
fn replay_file(mut tables: Tables, path: &Path, report: &mut AggregateReport) -> Tables {
    match read_page(path) {
        Ok(page) => {
            let normalized = normalize(&page);
            report.missing_sections += normalized.missing.len();
            report.skipped_items += normalized.skipped_items;
            tables.append(normalized);
            report.loaded += 1;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not load cached page, skipping");
            report.not_loaded.push(path.to_path_buf());
        }
    }
    tables
}

/// Write every table of `tables` to `sink` under one snapshot index.
pub fn write_snapshot<S: TableSink>(sink: &S, tables: &Tables, index: usize) -> Result<()> {
    sink.write_table(TWEETS_TABLE, index, &tables.tweets)?;
    sink.write_table(USERS_TABLE, index, &tables.users)?;
    sink.write_table(MEDIA_TABLE, index, &tables.media)?;
    sink.write_table(REFERENCED_TABLE, index, &tables.referenced)?;
    sink.write_table(EDGES_TABLE, index, &tables.edges)?;
    Ok(())
}
