//! Meshtastic transport for the mesh alert relay.
//!
//! This crate provides the [`TransportSink`] seam between the relay and the
//! radio, plus two implementations:
//!
//! - [`MeshtasticCli`] - runs `meshtastic --sendtext ... --ch-index N --dest ^all`
//! - [`DryRunSink`] - logs the message instead of transmitting it
//!
//! # Example
//!
//! ```no_run
//! use mesh_transport::{CliConfig, MeshtasticCli, TransportSink};
//!
//! # async fn example() -> Result<(), mesh_transport::TransportError> {
//! let sink = MeshtasticCli::new(CliConfig::default());
//! sink.send(0, "MeshSTL Alert:\nTest message").await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod sink;

pub use cli::MeshtasticCli;
pub use config::{CliConfig, NodeConnection, BROADCAST_DEST, DEFAULT_PROGRAM};
pub use error::TransportError;
pub use sink::{DryRunSink, TransportSink};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
