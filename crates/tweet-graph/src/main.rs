//! tweet-graph CLI - drain Twitter/X v2 endpoints into interaction tables.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tweet_graph::aggregate::{write_snapshot, AggregateConfig, Aggregator, DEFAULT_AGG_INTERVAL};
use tweet_graph::config::ApiConfig;
use tweet_graph::normalize::Tables;
use tweet_graph::storage::{JsonTableSink, PageArchive, TableFormat, TableSink};
use tweet_graph::twitter::{
    DrainStats, FollowingList, PaginationConfig, Paginator, TwitterClient, SEARCH_MAX_RESULTS,
};

/// tweet-graph - Pull tweets and follow lists, emit interaction tables.
#[derive(Parser)]
#[command(name = "tweet-graph")]
#[command(about = "Twitter/X v2 pagination and normalization pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drain a full-archive search into tables
    Search {
        /// Search query
        #[arg(long)]
        query: String,

        /// Earliest tweet time (RFC 3339)
        #[arg(long)]
        start_time: DateTime<Utc>,

        /// Tweets per page (10-500)
        #[arg(long, default_value_t = SEARCH_MAX_RESULTS)]
        max_results: u32,

        /// Archive raw pages into this directory
        #[arg(long, env = "TWEET_GRAPH_PAGES_DIR")]
        pages_dir: Option<PathBuf>,

        /// Output directory for tables
        #[arg(long, default_value = "./tables")]
        output: PathBuf,

        /// Table format (jsonl or json)
        #[arg(long, default_value = "jsonl")]
        format: TableFormat,

        /// Requests allowed per 15-minute window
        #[arg(long)]
        max_requests: Option<u32>,

        /// Resume from a cursor printed by an interrupted run
        #[arg(long)]
        next_token: Option<String>,
    },

    /// Drain the accounts a user follows
    Following {
        /// Numeric user id
        #[arg(long)]
        user_id: String,

        /// Output directory for the table
        #[arg(long, default_value = "./tables")]
        output: PathBuf,

        /// Table format (jsonl or json)
        #[arg(long, default_value = "jsonl")]
        format: TableFormat,
    },

    /// Replay archived pages into cumulative snapshots
    Aggregate {
        /// Directory of archived raw pages
        #[arg(long)]
        input: PathBuf,

        /// Output directory for snapshots
        #[arg(long, default_value = "./tables")]
        output: PathBuf,

        /// Files between snapshots
        #[arg(long, default_value_t = DEFAULT_AGG_INTERVAL)]
        interval: usize,

        /// Table format (jsonl or json)
        #[arg(long, default_value = "jsonl")]
        format: TableFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("tweet_graph=debug,info")
    } else {
        EnvFilter::new("tweet_graph=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Search {
            query,
            start_time,
            max_results,
            pages_dir,
            output,
            format,
            max_requests,
            next_token,
        } => {
            tracing::info!(query, %start_time, max_results, next_token, "Starting search");
            let mut pagination = PaginationConfig::search();
            if let Some(max) = max_requests {
                pagination.rate_limit.max_requests_per_window = max;
            }
            run_search(
                &query,
                start_time,
                max_results,
                pagination,
                next_token,
                pages_dir,
                JsonTableSink::new(output, format),
            )
            .await
        }
        Commands::Following {
            user_id,
            output,
            format,
        } => {
            tracing::info!(user_id, "Fetching following list");
            run_following(&user_id, JsonTableSink::new(output, format)).await
        }
        Commands::Aggregate {
            input,
            output,
            interval,
            format,
        } => {
            tracing::info!(input = %input.display(), interval, "Starting aggregation");
            run_aggregate(input, interval, JsonTableSink::new(output, format))
        }
    }
}

async fn run_search(
    query: &str,
    start_time: DateTime<Utc>,
    max_results: u32,
    pagination: PaginationConfig,
    next_token: Option<String>,
    pages_dir: Option<PathBuf>,
    sink: JsonTableSink,
) -> Result<()> {
    let client = TwitterClient::new(ApiConfig::from_env()?)?;
    let search = client.search(query, start_time).with_max_results(max_results)?;

    let mut paginator = Paginator::new(pagination)?;
    if let Some(cursor) = next_token {
        paginator = paginator.starting_at(cursor);
    }
    if let Some(dir) = pages_dir {
        let archive = PageArchive::new(dir, "search");
        let first_index = archive.next_index()?;
        if first_index > 0 {
            tracing::info!(first_index, dir = %archive.dir().display(), "Continuing existing page archive");
        }
        paginator = paginator.with_archive(archive, first_index);
    }

    let mut tables = Tables::new();
    let result = paginator.drain(&search, &mut tables).await;

    // Keep whatever was gathered before a failure.
    let index = tables.counts().tweets;
    write_snapshot(&sink, &tables, index)
        .with_context(|| format!("Failed to write tables to {}", sink.dir().display()))?;

    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            if e.is_transport() {
                if let Some(cursor) = paginator.resume_cursor() {
                    eprintln!("Resume with: --next-token {cursor}");
                }
            }
            return Err(e.into());
        }
    };

    let counts = tables.counts();
    println!("\n📊 Search Summary");
    print_stats(&stats);
    println!("   Tweets: {}", counts.tweets);
    println!("   Users: {}", counts.users);
    println!("   Media: {}", counts.media);
    println!("   Referenced: {}", counts.referenced);
    println!("   Interactions: {}", counts.edges);
    println!("   Output: {}", sink.dir().display());

    Ok(())
}

async fn run_following(user_id: &str, sink: JsonTableSink) -> Result<()> {
    let client = TwitterClient::new(ApiConfig::from_env()?)?;
    let query = client.following(user_id);

    let mut paginator = Paginator::new(PaginationConfig::following())?;
    let mut list = FollowingList::new();
    let stats = paginator.drain(&query, &mut list).await?;

    let path = sink.write_table("following", list.users.len(), &list.users)?;

    println!("\n📊 Following Summary");
    print_stats(&stats);
    println!("   Accounts: {}", list.users.len());
    if list.skipped_items > 0 {
        println!("   Skipped: {}", list.skipped_items);
    }
    println!("   Output: {}", path.display());

    Ok(())
}

fn run_aggregate(input: PathBuf, interval: usize, sink: JsonTableSink) -> Result<()> {
    let config = AggregateConfig::new(input).with_interval(interval);
    let aggregator = Aggregator::new(config, sink)?;
    let aggregated = aggregator.run()?;
    let report = &aggregated.report;

    println!("\n📊 Aggregation Summary");
    println!("   Files: {}", report.files);
    println!("   Loaded: {}", report.loaded);
    println!("   Snapshots: {}", report.flushes.len());

    if !report.not_loaded.is_empty() {
        println!("   Not loaded: {}", report.not_loaded.len());
        for path in &report.not_loaded {
            eprintln!("     - {}", path.display());
        }
    }

    let failed: Vec<_> = report.flushes.iter().filter(|f| !f.succeeded()).collect();
    if !failed.is_empty() {
        println!("   Failed snapshots: {}", failed.len());
        for flush in failed {
            eprintln!(
                "     - {}: {}",
                flush.index,
                flush.error.as_deref().unwrap_or_default()
            );
        }
    }

    let counts = aggregated.tables.counts();
    println!(
        "   Tables: {} tweets, {} users, {} media, {} referenced, {} interactions",
        counts.tweets, counts.users, counts.media, counts.referenced, counts.edges
    );

    Ok(())
}

fn print_stats(stats: &DrainStats) {
    println!("   Pages: {}", stats.pages);
    println!("   Requests: {}", stats.requests);
    println!("   Results: {}", stats.results);
    println!("   Rate-limit pauses: {}", stats.rate_limit_pauses);
    println!("   Stopped: {:?}", stats.stop);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_accepts_resume_cursor() {
        let cli = Cli::try_parse_from([
            "tweet-graph",
            "search",
            "--query",
            "from:jack",
            "--start-time",
            "2006-03-21T00:00:00Z",
            "--next-token",
            "b26v89c19zqg8o3f",
            "--pages-dir",
            "/tmp/pages",
        ])
        .unwrap();

        match cli.command {
            Commands::Search {
                next_token,
                pages_dir,
                max_results,
                ..
            } => {
                assert_eq!(next_token.as_deref(), Some("b26v89c19zqg8o3f"));
                assert_eq!(pages_dir, Some(PathBuf::from("/tmp/pages")));
                assert_eq!(max_results, SEARCH_MAX_RESULTS);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_search_cursor_is_optional() {
        let cli = Cli::try_parse_from([
            "tweet-graph",
            "search",
            "--query",
            "q",
            "--start-time",
            "2021-01-01T00:00:00Z",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Search {
                next_token: None,
                ..
            }
        ));
    }
}
