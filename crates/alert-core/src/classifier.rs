//! Alert classification and message rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::alert::{Alert, OutboundMessage};
use crate::ledger::DeliveryLedger;
use crate::policy::ChannelPolicy;
use crate::registry::CodeRegistry;

/// Hard cap on rendered message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

/// Substituted when an alert's expiry cannot be parsed.
pub const UNKNOWN_TIME: &str = "Unknown Time";

const EXPIRES_FORMAT: &str = "%b %d, %I:%M %p";

/// ISO-8601 forms with an offset that RFC 3339 rejects.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y%m%dT%H%M%S%:z",
    "%Y%m%dT%H%M%S%z",
    "%Y%m%dT%H%M%:z",
];

/// Offset-less forms, shown as-is.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y%m%dT%H%M%S"];

/// Decide which messages `alert` produces on the channel described by `policy`.
///
/// Produces one message per matched geographic code that the registry can
/// resolve. Whenever the alert passes the category, dedup and geography gates,
/// the (alert, channel) pair is recorded in `ledger` exactly once, even when
/// every matched code was a registry miss and nothing was rendered.
pub fn classify<L>(
    alert: &Alert,
    policy: &ChannelPolicy,
    ledger: &mut L,
    registry: &CodeRegistry,
    now: DateTime<Utc>,
) -> Vec<OutboundMessage>
where
    L: DeliveryLedger + ?Sized,
{
    let channel = policy.channel_id;

    if !policy.allows_category(&alert.category) {
        debug!(channel, alert_id = %alert.id, category = %alert.category, "Skipped: category not allowed");
        return Vec::new();
    }

    if ledger.has_notified(&alert.id, channel) {
        debug!(channel, alert_id = %alert.id, category = %alert.category, "Skipped: already sent");
        return Vec::new();
    }

    let matched = policy.matching_codes(&alert.geo_codes);
    if matched.is_empty() {
        debug!(channel, alert_id = %alert.id, category = %alert.category, "Skipped: no geographic match");
        return Vec::new();
    }

    let expires = format_expires(alert.expires.as_deref());

    let mut messages = Vec::with_capacity(matched.len());
    for code in &matched {
        match registry.lookup(code) {
            Some(county) => {
                let text = render_message(
                    &policy.message_prefix,
                    &alert.category,
                    &county.label,
                    &expires,
                );
                messages.push(OutboundMessage::new(channel, alert.id.clone(), text));
            }
            None => {
                debug!(channel, alert_id = %alert.id, code = %code, "No label for code, skipping");
            }
        }
    }

    ledger.record(&alert.id, channel, now);
    debug!(
        channel,
        alert_id = %alert.id,
        category = %alert.category,
        messages = messages.len(),
        "Alert classified"
    );

    messages
}

/// Render the message body and cap it at [`MAX_MESSAGE_CHARS`].
pub fn render_message(prefix: &str, category: &str, label: &str, expires: &str) -> String {
    let full = format!("{prefix}\n⚠️ {category} for {label} until {expires}");
    truncate_chars(full, MAX_MESSAGE_CHARS)
}

/// Format an ISO-8601 expiry in its own offset, or [`UNKNOWN_TIME`] when unparsable.
pub fn format_expires(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return UNKNOWN_TIME.to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(EXPIRES_FORMAT).to_string();
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return dt.format(EXPIRES_FORMAT).to_string();
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format(EXPIRES_FORMAT).to_string();
        }
    }

    // A bare date means midnight.
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return dt.format(EXPIRES_FORMAT).to_string();
    }

    UNKNOWN_TIME.to_string()
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text,
    }
}
