//! CAP alert feed client.
//!
//! This crate fetches active hazard alerts from the National Weather Service
//! API (`/alerts/active?area=XX`) and normalizes them into
//! [`alert_core::Alert`] values.
//!
//! # Example
//!
//! ```no_run
//! use cap_feed::{CapClient, FeedConfig, FeedSource};
//!
//! # async fn example() -> Result<(), cap_feed::FeedError> {
//! let client = CapClient::new(FeedConfig::new(["MO", "IL"]))?;
//! for alert in client.fetch_alerts().await? {
//!     println!("{}: {}", alert.id, alert.category);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

use alert_core::Alert;
use async_trait::async_trait;

pub use client::CapClient;
pub use config::FeedConfig;
pub use error::FeedError;

/// Source of raw alerts, polled once per cycle.
///
/// Abstracted so the poll loop can be driven by a canned feed in tests.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch every currently active alert.
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, FeedError>;
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
