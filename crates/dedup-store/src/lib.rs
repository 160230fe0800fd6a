//! File-backed delivery ledger for the mesh alert relay.
//!
//! The store remembers, per alert id, which channels have already received
//! the alert. It is loaded once at startup, mutated in memory during a poll
//! cycle, pruned by age and written back atomically at the end of the cycle.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use alert_core::DeliveryLedger;
//! use chrono::Utc;
//! use dedup_store::DedupStore;
//!
//! # fn example() -> dedup_store::Result<()> {
//! let mut store = DedupStore::open("./data/sent_alerts.json");
//!
//! store.record("urn:oid:2.49.0.1.840.0.abc", 0, Utc::now());
//! assert!(store.has_notified("urn:oid:2.49.0.1.840.0.abc", 0));
//!
//! let removed = store.prune(Utc::now(), Duration::from_secs(7 * 24 * 3600));
//! store.persist()?;
//! # let _ = removed;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod record;
mod store;

pub use error::{Result, StoreError};
pub use record::{DeliveryRecord, STATE_VERSION};
pub use store::{load_records, DedupStore};
