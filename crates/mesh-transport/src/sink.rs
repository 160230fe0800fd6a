//! Transport sink trait and simple implementations.

use alert_core::ChannelId;
use async_trait::async_trait;

use crate::error::TransportError;

/// Trait for handing one message to the radio.
///
/// Abstracted to support different transports (CLI, dry run, tests).
/// Implementations are not expected to be safe for concurrent writers; the
/// broadcaster serializes access.
#[async_trait]
pub trait TransportSink: Send + Sync {
    /// Send `text` on `channel_id`.
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// A sink that only logs what it would have sent.
#[derive(Debug, Clone, Default)]
pub struct DryRunSink;

#[async_trait]
impl TransportSink for DryRunSink {
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError> {
        tracing::info!("[Dry Run] Would send on channel {}: {}", channel_id, text);
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
