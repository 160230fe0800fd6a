//! Error types for the relay binary.

use alert_core::CoreError;
use cap_feed::FeedError;
use mesh_transport::TransportError;
use thiserror::Error;

/// Errors that stop the relay from starting.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Could not read the channel configuration file.
    #[error("failed to read {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Channel policy or registry was rejected.
    #[error("invalid channel configuration: {0}")]
    Policy(#[from] CoreError),

    /// Feed client setup failed.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Transport setup failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
