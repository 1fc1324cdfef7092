//! Error types for fetching, normalizing and persisting tables.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the fetch collaborators, the paginator and storage.
#[derive(Debug, Error)]
pub enum Error {
    /// The API answered with a non-success status.
    #[error("API error (status {status}): {body}")]
    Transport { status: u16, body: String },

    /// HTTP request failed before a status was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 2xx but the body was not a page document.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read a cached page or write a table
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the fetch collaborator.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Http(_) | Self::MalformedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_carries_status_and_body() {
        let err = Error::Transport {
            status: 429,
            body: "Too Many Requests".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 429): Too Many Requests");
        assert!(err.is_transport());
    }

    #[test]
    fn test_io_is_not_transport() {
        let err = Error::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!err.is_transport());
        assert!(err.to_string().contains("/tmp/missing.json"));
    }
}
