//! API client configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the app bearer token.
pub const BEARER_TOKEN_ENV: &str = "TWITTER_BEARER_TOKEN";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "TWITTER_API_BASE";
/// Public v2 API host.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Connection settings for the v2 API.
#[derive(Clone)]
pub struct ApiConfig {
    /// App-only bearer token.
    pub bearer_token: String,
    /// Scheme and host, without the `/2` prefix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Load from `TWITTER_BEARER_TOKEN` and optional `TWITTER_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let bearer_token = std::env::var(BEARER_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{BEARER_TOKEN_ENV} not set")))?;

        let mut config = Self::new(bearer_token);
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            config.base_url = base;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// Keep the token out of logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bearer_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let config = ApiConfig::new("super-secret").with_base_url("http://localhost:1234");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("localhost:1234"));
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::new("t");
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
