//! Core types and classification for the mesh alert relay.
//!
//! This crate provides the shared vocabulary for every other crate in the
//! workspace:
//!
//! - [`Alert`] / [`OutboundMessage`] - a fetched hazard alert and a rendered message
//! - [`CodeRegistry`] - geographic code to county label lookup
//! - [`ChannelPolicy`] / [`ChannelPolicySet`] - per-channel filter configuration
//! - [`DeliveryLedger`] - the trait a dedup store implements
//! - [`classify`] - decides which messages an alert produces for one channel
//! - [`Shutdown`] - an interruptible wait primitive shared by all long waits
//!
//! # Example
//!
//! ```rust
//! use alert_core::{classify, Alert, ChannelPolicySet, CodeRegistry, MemoryLedger};
//! use chrono::Utc;
//!
//! let policies = ChannelPolicySet::default();
//! let registry = CodeRegistry::default();
//! let mut ledger = MemoryLedger::default();
//!
//! let alert = Alert::new("A1", "Tornado Warning")
//!     .with_expires("2024-05-01T10:00:00-05:00")
//!     .with_geo_codes(["029099"]);
//!
//! let policy = policies.get(0).unwrap();
//! let messages = classify(&alert, policy, &mut ledger, &registry, Utc::now());
//! assert_eq!(messages.len(), 1);
//! ```

mod alert;
mod classifier;
mod error;
mod ledger;
mod policy;
mod registry;
mod shutdown;

pub use alert::{Alert, OutboundMessage};
pub use classifier::{classify, format_expires, render_message, MAX_MESSAGE_CHARS, UNKNOWN_TIME};
pub use error::CoreError;
pub use ledger::{DeliveryLedger, MemoryLedger};
pub use policy::{ChannelId, ChannelPolicy, ChannelPolicySet};
pub use registry::{CodeRegistry, CountyLabel};
pub use shutdown::{Shutdown, ShutdownTrigger};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
