//! Error types for alert-core.

use thiserror::Error;

use crate::policy::ChannelId;

/// Errors raised while building policies or registries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two policies claim the same channel id.
    #[error("duplicate channel id: {0}")]
    DuplicateChannel(ChannelId),

    /// A policy set with no channels is useless for a relay.
    #[error("no channels configured")]
    NoChannels,

    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
