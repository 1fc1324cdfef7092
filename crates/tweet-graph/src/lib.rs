//! Pagination and normalization engine for the Twitter v2 API.
//!
//! This crate provides:
//! - Cursor-driven pagination with a client-side request window
//! - Flattening of raw pages into tweet, user, media and interaction tables
//! - Interaction classification (retweet, quote, reply, mention)
//! - Replay of archived pages into cumulative table snapshots

pub mod aggregate;
pub mod config;
pub mod error;
pub mod normalize;
pub mod storage;
pub mod twitter;

// Re-export main types
pub use aggregate::{
    write_snapshot, AggregateConfig, AggregateReport, Aggregated, Aggregator, FlushEvent,
};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use normalize::{classify, normalize, NormalizedPage, Tables};
pub use storage::{JsonTableSink, PageArchive, TableFormat, TableSink};
pub use twitter::{
    drain, DrainStats, Drained, FollowingList, InteractionEdge, InteractionType, PaginationConfig,
    Paginator, RawPage, StopReason, TwitterClient,
};
