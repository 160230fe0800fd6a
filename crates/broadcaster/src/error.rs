//! Error types for broadcaster.

use thiserror::Error;

/// Errors from the cross-process send lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Filesystem error while creating, inspecting or removing the lock file.
    #[error("lock file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Shutdown was requested while waiting for the lock.
    #[error("interrupted while waiting for the send lock")]
    Interrupted,
}

/// Errors that can occur during broadcast operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The send lock could not be taken.
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
}
