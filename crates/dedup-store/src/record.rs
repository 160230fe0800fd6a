//! Persisted record types.

use std::collections::{BTreeMap, BTreeSet};

use alert_core::ChannelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk schema version.
pub const STATE_VERSION: u32 = 1;

/// Which channels have received one alert, and when it was last seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Channels this alert id has already been sent to.
    pub channels_notified: BTreeSet<ChannelId>,
    /// Last time a channel was recorded for this alert.
    pub last_touched: DateTime<Utc>,
}

impl DeliveryRecord {
    /// A record with no channels yet.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            channels_notified: BTreeSet::new(),
            last_touched: now,
        }
    }
}

/// The whole state file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub alerts: BTreeMap<String, DeliveryRecord>,
}
