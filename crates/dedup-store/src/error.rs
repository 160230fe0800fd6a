//! Dedup store error types.

use thiserror::Error;

/// Errors that can occur while persisting delivery state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error (create dir, write temp file, rename).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The temp file could not be moved over the state file.
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for dedup store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
