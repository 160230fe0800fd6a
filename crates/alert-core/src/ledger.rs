//! Delivery ledger trait.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::policy::ChannelId;

/// Tracks which (alert, channel) pairs have already been delivered.
///
/// The persistent implementation lives in the `dedup-store` crate; the
/// classifier only needs these two operations.
pub trait DeliveryLedger {
    /// Whether `alert_id` was already delivered to `channel_id`.
    fn has_notified(&self, alert_id: &str, channel_id: ChannelId) -> bool;

    /// Mark `alert_id` as delivered to `channel_id`. Idempotent apart from
    /// refreshing the record's timestamp.
    fn record(&mut self, alert_id: &str, channel_id: ChannelId, now: DateTime<Utc>);
}

/// Non-persistent ledger for tests and one-off runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: HashMap<String, (BTreeSet<ChannelId>, DateTime<Utc>)>,
}

impl MemoryLedger {
    /// Number of distinct alert ids recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DeliveryLedger for MemoryLedger {
    fn has_notified(&self, alert_id: &str, channel_id: ChannelId) -> bool {
        self.entries
            .get(alert_id)
            .is_some_and(|(channels, _)| channels.contains(&channel_id))
    }

    fn record(&mut self, alert_id: &str, channel_id: ChannelId, now: DateTime<Utc>) {
        let entry = self
            .entries
            .entry(alert_id.to_string())
            .or_insert_with(|| (BTreeSet::new(), now));
        entry.0.insert(channel_id);
        entry.1 = now;
    }
}
