//! Mesh alert relay.
//!
//! Polls the NWS CAP feed, filters each alert against per-channel policies,
//! and relays the survivors onto Meshtastic channels without repeating an
//! alert on a channel that has already seen it.
//!
//! # Example
//!
//! ```no_run
//! use alert_core::Shutdown;
//! use alert_relay::{build_relay, RelayConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = RelayConfig::from_env()?;
//! config.dry_run = true;
//!
//! let relay = build_relay(&config)?;
//! relay.run(Shutdown::never()).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod relay;

use std::sync::Arc;

use broadcaster::{Broadcaster, SendLock};
use cap_feed::CapClient;
use dedup_store::DedupStore;
use mesh_transport::{DryRunSink, MeshtasticCli, TransportSink};

pub use config::RelayConfig;
pub use error::RelayError;
pub use relay::{CycleSummary, Relay};

/// Wire up a relay against the live feed and radio described by `config`.
pub fn build_relay(config: &RelayConfig) -> Result<Relay<CapClient>, RelayError> {
    let feed = CapClient::new(config.feed.clone())?;

    let sink: Arc<dyn TransportSink> = if config.dry_run {
        Arc::new(DryRunSink)
    } else {
        Arc::new(MeshtasticCli::new(config.cli.clone()))
    };
    let broadcaster = Broadcaster::new(sink, SendLock::new(&config.lock_file));

    let store = DedupStore::open(&config.state_file);

    Ok(Relay::new(
        feed,
        broadcaster,
        config.policies.clone(),
        config.registry.clone(),
        store,
    )
    .with_poll_interval(config.poll_interval)
    .with_retention(config.retention)
    .with_clear_on_exit(config.clear_on_exit))
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
