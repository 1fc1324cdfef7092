//! Twitter/X v2 API access.
//!
//! Provides the page model, HTTP fetchers and the rate-limited paginator.

mod client;
mod following;
mod paginator;
pub(crate) mod types;

pub use client::{FollowingQuery, SearchQuery, TwitterClient, FOLLOWING_MAX_RESULTS, SEARCH_MAX_RESULTS};
pub use following::FollowingList;
pub use paginator::{
    drain, DrainStats, Drained, PageConsumer, PageFetcher, PaginationConfig, Paginator, RateLimit,
    StopReason,
};
pub use types::{
    canonical_id, Includes, InteractionEdge, InteractionType, MediaRecord, PageMeta, RawPage,
    TweetRecord, UserRecord,
};
