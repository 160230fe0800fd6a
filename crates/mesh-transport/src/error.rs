//! Error types for mesh-transport.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when handing a message to the radio.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The CLI could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The CLI ran but reported failure.
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    /// The CLI did not finish in time.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
