//! HTTP fetchers for the v2 search and following endpoints.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

use super::paginator::PageFetcher;
use super::types::RawPage;

const TWEET_FIELDS: &str = "id,text,author_id,conversation_id,entities,in_reply_to_user_id,referenced_tweets,attachments,created_at,public_metrics";
const EXPANSIONS: &str =
    "attachments.media_keys,author_id,in_reply_to_user_id,referenced_tweets.id.author_id";
const MEDIA_FIELDS: &str = "media_key,type,url";
const USER_FIELDS: &str = "id,location,name,public_metrics,url,username,verified";

/// Largest page the full-archive search endpoint serves.
pub const SEARCH_MAX_RESULTS: u32 = 500;
/// Largest page the following endpoint serves.
pub const FOLLOWING_MAX_RESULTS: u32 = 1000;

/// Thin v2 API client: bearer auth, status mapping, page decoding.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    config: ApiConfig,
}

impl TwitterClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Full-archive search for `query` starting at `start_time`.
    #[must_use]
    pub fn search(&self, query: impl Into<String>, start_time: DateTime<Utc>) -> SearchQuery<'_> {
        SearchQuery {
            client: self,
            query: query.into(),
            start_time,
            max_results: SEARCH_MAX_RESULTS,
        }
    }

    /// Accounts followed by `user_id`.
    #[must_use]
    pub fn following(&self, user_id: impl Into<String>) -> FollowingQuery<'_> {
        FollowingQuery {
            client: self,
            user_id: user_id.into(),
        }
    }

    /// GET `path` and decode the body as a page.
    async fn get_page(&self, path: &str, params: &[(&str, String)]) -> Result<RawPage> {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        tracing::debug!(url, "Requesting page");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.bearer_token)
            .header(CONTENT_TYPE, "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

/// Paged full-archive search request.
#[derive(Debug, Clone)]
pub struct SearchQuery<'a> {
    client: &'a TwitterClient,
    query: String,
    start_time: DateTime<Utc>,
    max_results: u32,
}

impl SearchQuery<'_> {
    /// Page size, between 10 and 500.
    pub fn with_max_results(mut self, max_results: u32) -> Result<Self> {
        if !(10..=SEARCH_MAX_RESULTS).contains(&max_results) {
            return Err(Error::Config(format!(
                "max_results must be between 10 and {SEARCH_MAX_RESULTS}, got {max_results}"
            )));
        }
        self.max_results = max_results;
        Ok(self)
    }

    fn params(&self, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", self.query.clone()),
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("expansions", EXPANSIONS.to_string()),
            ("media.fields", MEDIA_FIELDS.to_string()),
            ("user.fields", USER_FIELDS.to_string()),
            (
                "start_time",
                self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("max_results", self.max_results.to_string()),
        ];
        if let Some(token) = cursor {
            params.push(("next_token", token.to_string()));
        }
        params
    }
}

#[async_trait]
impl<'a> PageFetcher for SearchQuery<'a> {
    async fn fetch(&self, cursor: Option<&str>) -> Result<RawPage> {
        self.client
            .get_page("/2/tweets/search/all", &self.params(cursor))
            .await
    }
}

/// Paged following-list request.
#[derive(Debug, Clone)]
pub struct FollowingQuery<'a> {
    client: &'a TwitterClient,
    user_id: String,
}

#[async_trait]
impl<'a> PageFetcher for FollowingQuery<'a> {
    async fn fetch(&self, cursor: Option<&str>) -> Result<RawPage> {
        let mut params = vec![("max_results", FOLLOWING_MAX_RESULTS.to_string())];
        if let Some(token) = cursor {
            params.push(("pagination_token", token.to_string()));
        }
        self.client
            .get_page(&format!("/2/users/{}/following", self.user_id), &params)
            .await
    }
}
