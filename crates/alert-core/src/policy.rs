//! Per-channel filter policies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mesh channel index.
pub type ChannelId = u32;

/// Filter configuration for one output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPolicy {
    /// Channel index on the mesh radio.
    pub channel_id: ChannelId,
    /// First line of every message sent on this channel.
    #[serde(rename = "prefix")]
    pub message_prefix: String,
    /// Geographic codes this channel cares about.
    #[serde(rename = "geo_codes", default)]
    pub allowed_geo_codes: BTreeSet<String>,
    /// Event categories this channel relays. Matched exactly, case-sensitive.
    #[serde(rename = "categories", default)]
    pub allowed_categories: BTreeSet<String>,
}

impl ChannelPolicy {
    /// Create a policy with empty allow-lists.
    pub fn new(channel_id: ChannelId, message_prefix: impl Into<String>) -> Self {
        Self {
            channel_id,
            message_prefix: message_prefix.into(),
            allowed_geo_codes: BTreeSet::new(),
            allowed_categories: BTreeSet::new(),
        }
    }

    /// Allow additional geographic codes.
    pub fn with_geo_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_geo_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Allow additional event categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_categories
            .extend(categories.into_iter().map(Into::into));
        self
    }

    /// Whether this channel relays the given category.
    pub fn allows_category(&self, category: &str) -> bool {
        self.allowed_categories.contains(category)
    }

    /// Codes from `geo_codes` that this channel cares about.
    pub fn matching_codes(&self, geo_codes: &BTreeSet<String>) -> BTreeSet<String> {
        geo_codes
            .intersection(&self.allowed_geo_codes)
            .cloned()
            .collect()
    }
}

/// The immutable set of channel policies, indexed by channel id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPolicySet {
    channels: BTreeMap<ChannelId, ChannelPolicy>,
}

impl ChannelPolicySet {
    /// Build a policy set, rejecting duplicate ids and empty input.
    pub fn new(policies: impl IntoIterator<Item = ChannelPolicy>) -> Result<Self, CoreError> {
        let mut channels = BTreeMap::new();
        for policy in policies {
            let id = policy.channel_id;
            if channels.insert(id, policy).is_some() {
                return Err(CoreError::DuplicateChannel(id));
            }
        }
        if channels.is_empty() {
            return Err(CoreError::NoChannels);
        }
        Ok(Self { channels })
    }

    /// Parse a JSON array of policies.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let policies: Vec<ChannelPolicy> = serde_json::from_str(json)?;
        Self::new(policies)
    }

    /// Look up a channel's policy.
    pub fn get(&self, channel_id: ChannelId) -> Option<&ChannelPolicy> {
        self.channels.get(&channel_id)
    }

    /// Iterate policies in ascending channel order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelPolicy> {
        self.channels.values()
    }

    /// Channel ids in ascending order.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.keys().copied().collect()
    }

    /// Number of configured channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false for a constructed set; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Whether `channel_id` relays `category`. Unknown channels allow nothing.
    pub fn categories_allow(&self, channel_id: ChannelId, category: &str) -> bool {
        self.get(channel_id)
            .is_some_and(|policy| policy.allows_category(category))
    }

    /// Codes shared between `geo_codes` and the channel's allow-list.
    pub fn geo_intersection(
        &self,
        channel_id: ChannelId,
        geo_codes: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        self.get(channel_id)
            .map(|policy| policy.matching_codes(geo_codes))
            .unwrap_or_default()
    }
}

const METRO_CODES: &[&str] = &[
    "017005", "017027", "017013", "017083", "017119", "017133", "017157", "017163", "017189",
    "029510", "029055", "029071", "029073", "029099", "029113", "029183", "029186", "029187",
    "029189", "029219", "029221",
];

const METRO_CATEGORIES: &[&str] = &[
    "Severe Thunderstorm Warning",
    "Tornado Warning",
    "Flash Flood Warning",
    "Tornado Watch",
    "Severe Thunderstorm Watch",
    "Flood Advisory",
    "Air Quality Alert",
    "Extreme Heat Watch",
    "Extreme Heat Warning",
];

const LOCAL_CATEGORIES: &[&str] = &[
    "Severe Thunderstorm Warning",
    "Tornado Warning",
    "Flash Flood Warning",
    "Tornado Watch",
    "Severe Thunderstorm Watch",
    "Fire Warning",
    "Earthquake Warning",
    "Shelter in Place Warning",
    "Snow Squall Warning",
    "911 Telephone Outage Emergency",
    "Child Abduction Emergency",
    "Civil Danger Warning",
    "Dust Storm Warning",
    "Evacuation Immediate",
    "Extreme Wind Warning",
    "Law Enforcement Warning",
    "Ice Storm Warning",
    "Civil Emergency Message",
    "Blizzard Warning",
    "Winter Storm Warning",
    "High Wind Warning",
    "Blowing Dust Warning",
    "Flood Advisory",
    "Winter Weather Advisory",
    "Winter Storm Watch",
    "Blowing Dust Advisory",
    "Dust Advisory",
    "Freeze Warning",
    "Freeze Watch",
    "Extreme Cold Watch",
    "Extreme Cold Warning",
    "Cold Weather Advisory",
    "Fire Weather Watch",
    "Excessive Heat Warning",
    "Excessive Heat Watch",
    "Frost Advisory",
    "Heat Advisory",
    "Air Quality Alert",
    "Air Stagnation Advisory",
    "Dense Fog Advisory",
    "Freezing Fog Advisory",
    "Dense Smoke Advisory",
    "High Wind Watch",
    "Special Weather Statement",
    "Extreme Heat Watch",
    "Extreme Heat Warning",
];

impl Default for ChannelPolicySet {
    /// Metro-wide severe weather on channel 0, everything for Jefferson County on channel 1.
    fn default() -> Self {
        let metro = ChannelPolicy::new(0, "MeshSTL Alert:")
            .with_geo_codes(METRO_CODES.iter().copied())
            .with_categories(METRO_CATEGORIES.iter().copied());
        let local = ChannelPolicy::new(1, "Local Alert:")
            .with_geo_codes(["029099"])
            .with_categories(LOCAL_CATEGORIES.iter().copied());

        let channels = [metro, local]
            .into_iter()
            .map(|policy| (policy.channel_id, policy))
            .collect();
        Self { channels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channels() {
        let set = ChannelPolicySet::default();
        assert_eq!(set.channel_ids(), vec![0, 1]);
        assert_eq!(set.get(0).unwrap().message_prefix, "MeshSTL Alert:");
        assert_eq!(set.get(1).unwrap().message_prefix, "Local Alert:");
        assert_eq!(set.get(1).unwrap().allowed_geo_codes.len(), 1);
    }

    #[test]
    fn test_categories_allow_is_exact() {
        let set = ChannelPolicySet::default();
        assert!(set.categories_allow(0, "Tornado Warning"));
        assert!(!set.categories_allow(0, "tornado warning"));
        assert!(!set.categories_allow(0, "Blizzard Warning"));
        assert!(set.categories_allow(1, "Blizzard Warning"));
        assert!(!set.categories_allow(7, "Tornado Warning"));
    }

    #[test]
    fn test_geo_intersection() {
        let set = ChannelPolicySet::default();
        let codes: BTreeSet<String> = ["029099", "029189", "999999"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(set.geo_intersection(0, &codes).len(), 2);
        let local = set.geo_intersection(1, &codes);
        assert_eq!(local.into_iter().collect::<Vec<_>>(), vec!["029099"]);
        assert!(set.geo_intersection(9, &codes).is_empty());
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let result = ChannelPolicySet::new([
            ChannelPolicy::new(2, "A"),
            ChannelPolicy::new(2, "B"),
        ]);
        assert!(matches!(result, Err(CoreError::DuplicateChannel(2))));
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            ChannelPolicySet::new(Vec::new()),
            Err(CoreError::NoChannels)
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"channel_id": 3, "prefix": "Test:", "geo_codes": ["017119"], "categories": ["Tornado Warning"]}
        ]"#;
        let set = ChannelPolicySet::from_json(json).unwrap();
        let policy = set.get(3).unwrap();
        assert_eq!(policy.message_prefix, "Test:");
        assert!(policy.allowed_geo_codes.contains("017119"));
    }
}
