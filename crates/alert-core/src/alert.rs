//! Alert and outbound message types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::ChannelId;

/// One hazard notification as fetched from the upstream feed.
///
/// Alerts are transient: they live for a single poll cycle and are never
/// persisted directly. The `id` is the dedup key; an empty id is allowed and
/// collapses with every other empty-id alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Feed-assigned identifier, possibly empty.
    pub id: String,
    /// Event type, e.g. "Tornado Warning".
    pub category: String,
    /// Raw expiry timestamp as delivered by the feed.
    #[serde(default)]
    pub expires: Option<String>,
    /// Geographic identifier codes the alert covers.
    #[serde(default)]
    pub geo_codes: BTreeSet<String>,
    /// When this alert was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl Alert {
    /// Create an alert with no expiry and no geographic codes.
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            expires: None,
            geo_codes: BTreeSet::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Set the raw expiry timestamp.
    pub fn with_expires(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Add geographic codes.
    pub fn with_geo_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geo_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Override the fetch timestamp.
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }
}

/// A rendered message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Channel the message is destined for.
    pub channel_id: ChannelId,
    /// Alert the message was rendered from (for log context).
    pub alert_id: String,
    /// Message body, already capped.
    pub text: String,
}

impl OutboundMessage {
    /// Create a new outbound message.
    pub fn new(channel_id: ChannelId, alert_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel_id,
            alert_id: alert_id.into(),
            text: text.into(),
        }
    }
}
