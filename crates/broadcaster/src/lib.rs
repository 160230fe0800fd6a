//! Serialized delivery of alert messages to the mesh radio.
//!
//! The radio cannot take concurrent writers, and other instances of the relay
//! (or an operator at the CLI) may share it. Every batch is therefore sent
//! while holding a cross-process [`SendLock`], with fixed pacing between
//! messages so the mesh is not flooded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use alert_core::{OutboundMessage, Shutdown};
//! use broadcaster::{Broadcaster, SendLock};
//! use mesh_transport::DryRunSink;
//!
//! # async fn example() -> Result<(), broadcaster::Error> {
//! let broadcaster = Broadcaster::new(Arc::new(DryRunSink), SendLock::new("/tmp/meshtastic_send.lock"));
//!
//! let messages = vec![OutboundMessage::new(0, "A1", "MeshSTL Alert:\nTest")];
//! let report = broadcaster.deliver(0, &messages, &Shutdown::never()).await?;
//! assert_eq!(report.sent, 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lock;

use std::sync::Arc;
use std::time::Duration;

use alert_core::{ChannelId, OutboundMessage, Shutdown};
use mesh_transport::{TransportError, TransportSink};
use tracing::{error, info, warn};

pub use error::{Error, LockError};
pub use lock::{LockToken, SendLock, SendLockGuard, DEFAULT_LOCK_PATH};

/// Delays that keep the radio within its duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Wait between consecutive messages of one batch.
    pub between_messages: Duration,
    /// Wait after the last message of a batch, still holding the lock.
    pub after_batch: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_messages: Duration::from_secs(5),
            after_batch: Duration::from_secs(5),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            between_messages: Duration::ZERO,
            after_batch: Duration::ZERO,
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Messages handed to the transport successfully.
    pub sent: usize,
    /// Messages never attempted because of a failure or shutdown.
    pub dropped: usize,
    /// The transport error that aborted the batch, if any.
    pub failure: Option<TransportError>,
    /// Shutdown cut the batch short.
    pub interrupted: bool,
}

impl DeliveryReport {
    /// Whether every message went out.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && !self.interrupted && self.dropped == 0
    }
}

/// Delivers message batches through a transport, one holder at a time.
#[derive(Clone)]
pub struct Broadcaster {
    sink: Arc<dyn TransportSink>,
    lock: SendLock,
    pacing: Pacing,
}

impl Broadcaster {
    /// Create a broadcaster with default pacing.
    pub fn new(sink: Arc<dyn TransportSink>, lock: SendLock) -> Self {
        Self {
            sink,
            lock,
            pacing: Pacing::default(),
        }
    }

    /// Override the pacing delays.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Get the underlying transport.
    pub fn sink(&self) -> &Arc<dyn TransportSink> {
        &self.sink
    }

    /// Get the send lock.
    pub fn lock(&self) -> &SendLock {
        &self.lock
    }

    /// Send `messages` on `channel_id`, in order, under the send lock.
    ///
    /// A transport failure abandons the rest of the batch; it is reported in
    /// the returned [`DeliveryReport`], not as an `Err`. The lock is released
    /// on every path once taken. Only a lock I/O failure is an `Err`.
    pub async fn deliver(
        &self,
        channel_id: ChannelId,
        messages: &[OutboundMessage],
        shutdown: &Shutdown,
    ) -> Result<DeliveryReport, Error> {
        let mut report = DeliveryReport::default();
        if messages.is_empty() {
            return Ok(report);
        }

        let _guard = match self.lock.acquire(shutdown).await {
            Ok(guard) => guard,
            Err(LockError::Interrupted) => {
                warn!(channel = channel_id, count = messages.len(), "Shutdown before send lock acquired");
                report.dropped = messages.len();
                report.interrupted = true;
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        };

        for (idx, message) in messages.iter().enumerate() {
            if let Err(e) = self.sink.send(channel_id, &message.text).await {
                error!(
                    channel = channel_id,
                    alert_id = %message.alert_id,
                    sink = self.sink.name(),
                    "Error sending message: {}",
                    e
                );
                report.dropped = messages.len() - idx - 1;
                report.failure = Some(e);
                return Ok(report);
            }
            report.sent += 1;

            let remaining = messages.len() - idx - 1;
            if remaining > 0 && !shutdown.sleep(self.pacing.between_messages).await {
                warn!(channel = channel_id, dropped = remaining, "Shutdown during send pacing");
                report.dropped = remaining;
                report.interrupted = true;
                return Ok(report);
            }
        }

        info!(channel = channel_id, sent = report.sent, "Batch delivered");

        if !shutdown.sleep(self.pacing.after_batch).await {
            report.interrupted = true;
        }
        Ok(report)
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("sink", &self.sink.name())
            .field("lock", &self.lock)
            .field("pacing", &self.pacing)
            .finish()
    }
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
