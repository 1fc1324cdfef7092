//! Cursor-driven pagination with rate-limit pauses.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::normalize::Tables;
use crate::storage::PageArchive;

use super::types::RawPage;

/// Performs the network call for one page.
///
/// `cursor` is `None` for the first page. Non-success responses must come
/// back as [`Error::Transport`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, cursor: Option<&str>) -> Result<RawPage>;
}

/// Receives every page the paginator accepts.
pub trait PageConsumer {
    /// Absorb one page, returning how many primary rows it added.
    fn consume(&mut self, page: &RawPage) -> usize;

    /// Primary rows accumulated so far.
    fn rows(&self) -> usize;
}

/// Request budget per time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed before the paginator pauses.
    pub max_requests_per_window: u32,
    /// Window length.
    pub window: Duration,
}

/// Configuration for draining an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Window-based request budget.
    pub rate_limit: RateLimit,
    /// Fixed pause after every successful fetch.
    pub request_delay: Duration,
}

impl PaginationConfig {
    /// Full-archive search: 300 requests / 15 min, one request every 3 s.
    #[must_use]
    pub fn search() -> Self {
        Self {
            rate_limit: RateLimit {
                max_requests_per_window: 300,
                window: Duration::from_secs(15 * 60),
            },
            request_delay: Duration::from_secs(3),
        }
    }

    /// Following lookup: 15 requests / 15 min.
    #[must_use]
    pub fn following() -> Self {
        Self {
            rate_limit: RateLimit {
                max_requests_per_window: 15,
                window: Duration::from_secs(15 * 60),
            },
            request_delay: Duration::ZERO,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.max_requests_per_window == 0 {
            return Err(Error::Config(
                "max_requests_per_window must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.window.is_zero() {
            return Err(Error::Config("rate limit window must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::search()
    }
}

/// Why a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no `next_token`.
    Exhausted,
    /// The first page reported `result_count == 0`.
    EmptyResult,
    /// A response without `data` or `meta`.
    MalformedTerminal,
}

/// Counters from one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    /// Pages handed to the consumer.
    pub pages: usize,
    /// Fetches issued.
    pub requests: usize,
    /// Sum of `meta.result_count` over accepted pages.
    pub results: u64,
    /// Times the paginator slept for the rate-limit window.
    pub rate_limit_pauses: usize,
    /// Request counter of the current window when the drain ended.
    pub requests_in_window: u32,
    /// Pages that could not be written to the archive.
    pub archive_failures: usize,
    pub stop: StopReason,
}

/// Request counter for the current rate-limit window.
///
/// The window opens with the first request after a reset.
#[derive(Debug)]
struct RequestWindow {
    limit: RateLimit,
    count: u32,
    opened: Option<Instant>,
}

impl RequestWindow {
    fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            count: 0,
            opened: None,
        }
    }

    /// Remaining window time if the budget is spent, `None` to go ahead.
    fn pause_needed(&mut self, now: Instant) -> Option<Duration> {
        let opened = self.opened?;
        let elapsed = now.saturating_duration_since(opened);
        if elapsed >= self.limit.window {
            self.reset();
            return None;
        }
        (self.count >= self.limit.max_requests_per_window).then(|| self.limit.window - elapsed)
    }

    fn record(&mut self, now: Instant) {
        self.opened.get_or_insert(now);
        self.count += 1;
    }

    fn reset(&mut self) {
        self.count = 0;
        self.opened = None;
    }
}

/// Drives a [`PageFetcher`] until the endpoint runs out of pages.
///
/// Failed requests are never retried: the error is logged with the cursor
/// and returned, and [`Paginator::resume_cursor`] still holds the cursor of
/// the failed request.
#[derive(Debug)]
pub struct Paginator {
    config: PaginationConfig,
    window: RequestWindow,
    cursor: Option<String>,
    archive: Option<PageArchive>,
    archived_pages: usize,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: RequestWindow::new(config.rate_limit),
            config,
            cursor: None,
            archive: None,
            archived_pages: 0,
        })
    }

    /// Write every accepted page to `archive` before consuming it.
    ///
    /// Files are numbered from `first_index`; pass
    /// [`PageArchive::next_index`] when resuming into a populated directory.
    #[must_use]
    pub fn with_archive(mut self, archive: PageArchive, first_index: usize) -> Self {
        self.archive = Some(archive);
        self.archived_pages = first_index;
        self
    }

    /// Start from a cursor logged by an earlier, interrupted drain.
    #[must_use]
    pub fn starting_at(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Cursor the next fetch would use; `None` once the endpoint is exhausted.
    pub fn resume_cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Requests counted in the current rate-limit window.
    pub fn requests_in_window(&self) -> u32 {
        self.window.count
    }

    /// Fetch pages until a terminal response, feeding each to `consumer`.
    pub async fn drain<F, C>(&mut self, fetcher: &F, consumer: &mut C) -> Result<DrainStats>
    where
        F: PageFetcher + ?Sized,
        C: PageConsumer,
    {
        let mut pages = 0usize;
        let mut requests = 0usize;
        let mut results = 0u64;
        let mut rate_limit_pauses = 0usize;
        let mut archive_failures = 0usize;

        let stop = loop {
            if let Some(wait) = self.window.pause_needed(Instant::now()) {
                let resume_at = chrono::Duration::from_std(wait)
                    .ok()
                    .map(|d| (Utc::now() + d).to_rfc3339());
                tracing::info!(
                    requests_in_window = self.window.count,
                    wait_secs = wait.as_secs(),
                    resume_at = ?resume_at,
                    page = pages,
                    "Pausing for rate limit"
                );
                tokio::time::sleep(wait).await;
                self.window.reset();
                rate_limit_pauses += 1;
            }

            self.window.record(Instant::now());
            requests += 1;

            // Only a page requested without a cursor is the query's first page.
            let first_of_query = self.cursor.is_none();
            let page = match fetcher.fetch(self.cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        cursor = ?self.cursor,
                        page = pages,
                        results_so_far = results,
                        rows_so_far = consumer.rows(),
                        requests_in_window = self.window.count,
                        "Fetch failed, stopping pagination"
                    );
                    return Err(e);
                }
            };

            if !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            let (Some(_), Some(meta)) = (page.data.as_ref(), page.meta.as_ref()) else {
                tracing::info!(cursor = ?self.cursor, "Response without data/meta, treating as end of stream");
                break StopReason::MalformedTerminal;
            };
            if first_of_query && meta.result_count == 0 {
                tracing::info!("Query returned no results");
                break StopReason::EmptyResult;
            }
            results += meta.result_count;

            if let Some(archive) = &self.archive {
                if let Err(e) = archive.write(self.archived_pages, self.cursor.as_deref(), &page) {
                    tracing::warn!(error = %e, page = self.archived_pages, "Failed to archive page");
                    archive_failures += 1;
                }
                self.archived_pages += 1;
            }

            let rows = consumer.consume(&page);
            pages += 1;
            tracing::debug!(page = pages, rows, result_count = meta.result_count, "Consumed page");

            match page.next_token() {
                Some(token) => self.cursor = Some(token.to_string()),
                None => {
                    self.cursor = None;
                    break StopReason::Exhausted;
                }
            }
        };

        let stats = DrainStats {
            pages,
            requests,
            results,
            rate_limit_pauses,
            requests_in_window: self.window.count,
            archive_failures,
            stop,
        };
        tracing::info!(
            pages = stats.pages,
            requests = stats.requests,
            results = stats.results,
            rows = consumer.rows(),
            pauses = stats.rate_limit_pauses,
            stop = ?stats.stop,
            "Pagination complete"
        );
        Ok(stats)
    }
}

/// Tables and counters from [`drain`].
#[derive(Debug)]
pub struct Drained {
    pub tables: Tables,
    pub stats: DrainStats,
}

/// Drain `fetcher` from the first page into fresh [`Tables`].
pub async fn drain<F>(fetcher: &F, config: PaginationConfig) -> Result<Drained>
where
    F: PageFetcher + ?Sized,
{
    let mut paginator = Paginator::new(config)?;
    let mut tables = Tables::new();
    let stats = paginator.drain(fetcher, &mut tables).await?;
    Ok(Drained { tables, stats })
}
