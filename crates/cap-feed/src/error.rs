//! Error types for cap-feed.

use thiserror::Error;

/// Errors that can occur while fetching the alert feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected GeoJSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success HTTP status.
    #[error("feed returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
