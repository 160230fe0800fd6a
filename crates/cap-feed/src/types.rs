//! GeoJSON payload types returned by the alerts API.

use alert_core::Alert;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Title used when a feature carries no event name.
pub const NO_TITLE: &str = "No Title";

/// Top-level `FeatureCollection` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// One alert feature.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub properties: AlertProperties,
}

/// The subset of CAP properties the relay uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertProperties {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub geocode: Geocode,
}

/// Geographic codes attached to an alert.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geocode {
    #[serde(rename = "SAME", default)]
    pub same: Vec<String>,
}

impl AlertProperties {
    /// Normalize into an [`Alert`], keyed on SAME codes.
    pub fn into_alert(self, fetched_at: DateTime<Utc>) -> Alert {
        Alert {
            id: self.id.unwrap_or_default(),
            category: self.event.unwrap_or_else(|| NO_TITLE.to_string()),
            expires: self.expires,
            geo_codes: self.geocode.same.into_iter().collect(),
            fetched_at,
        }
    }
}

impl FeatureCollection {
    /// Convert every feature into an [`Alert`].
    pub fn into_alerts(self, fetched_at: DateTime<Utc>) -> Vec<Alert> {
        self.features
            .into_iter()
            .map(|feature| feature.properties.into_alert(fetched_at))
            .collect()
    }
}
