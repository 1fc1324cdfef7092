//! Integration tests for replaying a page archive into table snapshots.

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tweet_graph::aggregate::{AggregateConfig, Aggregator, EDGES_TABLE, TWEETS_TABLE};
use tweet_graph::storage::{JsonTableSink, PageArchive, TableFormat, TableSink};
use tweet_graph::twitter::RawPage;
use tweet_graph::{Error, Result};

// =============================================================================
// Test Sinks
// =============================================================================

/// Remembers `(table, index, rows)` for every write.
#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<(String, usize, usize)>>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Default::default()
        }
    }

    fn rows_of(&self, table: &str) -> Vec<(usize, usize)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _, _)| name == table)
            .map(|(_, index, rows)| (*index, *rows))
            .collect()
    }
}

impl TableSink for RecordingSink {
    fn write_table<T: Serialize>(&self, name: &str, index: usize, rows: &[T]) -> Result<PathBuf> {
        if self.fail_at == Some(index) {
            return Err(Error::Config(format!("sink unavailable at {index}")));
        }
        self.writes
            .lock()
            .unwrap()
            .push((name.to_string(), index, rows.len()));
        Ok(PathBuf::from(format!("{name}_{index}")))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A page with one tweet by `author` mentioning user "9".
fn page(tweet_id: usize, author: &str) -> RawPage {
    serde_json::from_value(json!({
        "data": [{
            "id": tweet_id.to_string(),
            "author_id": author,
            "entities": { "mentions": [{ "id": "9" }] }
        }],
        "includes": { "users": [{ "id": author, "username": format!("user{author}") }] },
        "meta": { "result_count": 1, "next_token": format!("N{tweet_id}") }
    }))
    .unwrap()
}

fn archive_pages(dir: &Path, count: usize) {
    let archive = PageArchive::new(dir, "search");
    for index in 0..count {
        let cursor = (index > 0).then(|| format!("N{}", index - 1));
        archive
            .write(index, cursor.as_deref(), &page(index, "1"))
            .unwrap();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_snapshots_are_cumulative_at_each_interval() {
    let input = tempfile::tempdir().unwrap();
    archive_pages(input.path(), 2500);

    let aggregator = Aggregator::new(
        AggregateConfig::new(input.path()).with_interval(1000),
        RecordingSink::default(),
    )
    .unwrap();
    let aggregated = aggregator.run().unwrap();

    let indices: Vec<_> = aggregated.report.flushes.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![1000, 2000, 2500]);
    assert!(aggregated.report.flushes.iter().all(|f| f.succeeded()));

    assert_eq!(
        aggregator.sink().rows_of(TWEETS_TABLE),
        vec![(1000, 1000), (2000, 2000), (2500, 2500)]
    );
    assert_eq!(
        aggregator.sink().rows_of(EDGES_TABLE),
        vec![(1000, 1000), (2000, 2000), (2500, 2500)]
    );
    assert_eq!(aggregated.report.loaded, 2500);
    assert_eq!(aggregated.tables.tweets.len(), 2500);
}

#[test]
fn test_unreadable_files_are_reported_not_loaded() {
    let input = tempfile::tempdir().unwrap();
    archive_pages(input.path(), 3);
    let broken = input.path().join("search_000001_zz.json");
    std::fs::write(&broken, "{ not json").unwrap();
    // Hidden files are not part of the archive.
    std::fs::write(input.path().join(".DS_Store"), "junk").unwrap();

    let aggregator = Aggregator::new(
        AggregateConfig::new(input.path()).with_interval(10),
        RecordingSink::default(),
    )
    .unwrap();
    let aggregated = aggregator.run().unwrap();

    assert_eq!(aggregated.report.files, 4);
    assert_eq!(aggregated.report.loaded, 3);
    assert_eq!(aggregated.report.not_loaded, vec![broken]);
    assert_eq!(aggregated.report.flushes.len(), 1);
    assert_eq!(aggregated.report.flushes[0].index, 4);
    assert_eq!(aggregated.report.flushes[0].counts.tweets, 3);
}

#[test]
fn test_failed_snapshot_keeps_accumulator() {
    let input = tempfile::tempdir().unwrap();
    archive_pages(input.path(), 5);

    let aggregator = Aggregator::new(
        AggregateConfig::new(input.path()).with_interval(2),
        RecordingSink::failing_at(2),
    )
    .unwrap();
    let aggregated = aggregator.run().unwrap();

    let outcomes: Vec<_> = aggregated
        .report
        .flushes
        .iter()
        .map(|f| (f.index, f.succeeded()))
        .collect();
    assert_eq!(outcomes, vec![(2, false), (4, true), (5, true)]);
    assert!(aggregated.report.flushes[0]
        .error
        .as_deref()
        .unwrap()
        .contains("sink unavailable"));

    // The snapshot after the failure still holds every earlier row.
    assert_eq!(
        aggregator.sink().rows_of(TWEETS_TABLE),
        vec![(4, 4), (5, 5)]
    );
}

#[test]
fn test_snapshot_files_on_disk() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    archive_pages(input.path(), 3);

    let sink = JsonTableSink::new(output.path(), TableFormat::JsonLines);
    let aggregated = Aggregator::new(AggregateConfig::new(input.path()).with_interval(2), sink)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(aggregated.report.flushes.len(), 2);

    for name in ["tweets", "users", "media", "referenced_tweets", "interactions"] {
        for index in [2, 3] {
            let path = output.path().join(format!("{name}_{index:06}.jsonl"));
            assert!(path.exists(), "missing {}", path.display());
        }
    }

    let edges = std::fs::read_to_string(output.path().join("interactions_000003.jsonl")).unwrap();
    let first: serde_json::Value = serde_json::from_str(edges.lines().next().unwrap()).unwrap();
    assert_eq!(first["src_user_id"], "1");
    assert_eq!(first["tar_user_id"], "9");
    assert_eq!(first["rtype"], "MENTION");
    assert_eq!(edges.lines().count(), 3);
}
