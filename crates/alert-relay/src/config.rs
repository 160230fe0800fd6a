//! Configuration for the relay.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alert_core::{ChannelPolicy, ChannelPolicySet, CodeRegistry, CountyLabel};
use broadcaster::DEFAULT_LOCK_PATH;
use cap_feed::FeedConfig;
use mesh_transport::CliConfig;
use serde::Deserialize;

use crate::error::RelayError;

/// Default state file location.
pub const DEFAULT_STATE_FILE: &str = "./data/sent_alerts.json";

/// Default seconds between polls.
pub const DEFAULT_POLL_SECS: u64 = 60;

/// Default dedup retention, one week.
pub const DEFAULT_RETENTION_HOURS: u64 = 168;

/// Everything the relay needs to start.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Log messages instead of transmitting them.
    pub dry_run: bool,
    /// Run a single cycle and exit.
    pub run_once: bool,
    /// Dedup state file.
    pub state_file: PathBuf,
    /// Cross-process send lock file.
    pub lock_file: PathBuf,
    /// How long a dedup record survives without being touched.
    pub retention: Duration,
    /// Wipe dedup state on shutdown instead of keeping it.
    pub clear_on_exit: bool,
    /// Channel filter policies.
    pub policies: ChannelPolicySet,
    /// Code to county lookup.
    pub registry: CodeRegistry,
    /// Upstream feed settings.
    pub feed: FeedConfig,
    /// Radio CLI settings.
    pub cli: CliConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            dry_run: false,
            run_once: false,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            lock_file: PathBuf::from(DEFAULT_LOCK_PATH),
            retention: Duration::from_secs(DEFAULT_RETENTION_HOURS * 3600),
            clear_on_exit: false,
            policies: ChannelPolicySet::default(),
            registry: CodeRegistry::default(),
            feed: FeedConfig::default(),
            cli: CliConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `CAP_CHECK_INTERVAL` - poll interval in seconds (default: 60)
    /// - `ALERT_STATE_FILE` - dedup state path (default: ./data/sent_alerts.json)
    /// - `ALERT_LOCK_FILE` - send lock path (default: /tmp/meshtastic_send.lock)
    /// - `ALERT_RETENTION_HOURS` - dedup retention (default: 168)
    /// - `ALERT_CONFIG_FILE` - JSON channel / registry overrides
    /// - `ALERT_CLEAR_ON_EXIT` - wipe dedup state on shutdown (default: false)
    ///
    /// Feed and radio settings are read by [`FeedConfig::from_env`] and
    /// [`CliConfig::from_env`].
    pub fn from_env() -> Result<Self, RelayError> {
        let mut config = Self {
            feed: FeedConfig::from_env()?,
            cli: CliConfig::from_env()?,
            ..Self::default()
        };

        if let Some(secs) = env_u64("CAP_CHECK_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Ok(path) = env::var("ALERT_STATE_FILE") {
            config.state_file = PathBuf::from(path);
        }
        if let Ok(path) = env::var("ALERT_LOCK_FILE") {
            config.lock_file = PathBuf::from(path);
        }
        if let Some(hours) = env_u64("ALERT_RETENTION_HOURS")? {
            config.retention = Duration::from_secs(hours * 3600);
        }
        if let Ok(val) = env::var("ALERT_CLEAR_ON_EXIT") {
            config.clear_on_exit = parse_bool(&val);
        }
        if let Ok(path) = env::var("ALERT_CONFIG_FILE") {
            config.apply_file(Path::new(&path))?;
        }

        Ok(config)
    }

    /// Replace channels and/or registry from a JSON file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), RelayError> {
        let data = std::fs::read_to_string(path).map_err(|source| RelayError::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        self.apply_json(&data)
    }

    /// Replace channels and/or registry from JSON text.
    pub fn apply_json(&mut self, json: &str) -> Result<(), RelayError> {
        let file: ChannelFile = serde_json::from_str(json)
            .map_err(|e| RelayError::Config(format!("invalid channel config: {}", e)))?;

        if let Some(channels) = file.channels {
            self.policies = ChannelPolicySet::new(channels)?;
        }
        if let Some(registry) = file.registry {
            self.registry = CodeRegistry::from_entries(
                registry
                    .into_iter()
                    .map(|(code, county)| (code, county.label, county.region)),
            );
        }
        Ok(())
    }
}

/// Shape of the optional configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChannelFile {
    #[serde(default)]
    channels: Option<Vec<ChannelPolicy>>,
    #[serde(default)]
    registry: Option<HashMap<String, CountyLabel>>,
}

fn env_u64(name: &str) -> Result<Option<u64>, RelayError> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| RelayError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.lock_file, PathBuf::from("/tmp/meshtastic_send.lock"));
        assert_eq!(config.policies.len(), 2);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_apply_json_channels_only() {
        let mut config = RelayConfig::default();
        config
            .apply_json(
                r#"{"channels": [{"channel_id": 2, "prefix": "KC Alert:", "geo_codes": ["029095"], "categories": ["Tornado Warning"]}]}"#,
            )
            .unwrap();

        assert_eq!(config.policies.channel_ids(), vec![2]);
        // Registry untouched.
        assert!(config.registry.lookup("029099").is_some());
    }

    #[test]
    fn test_apply_json_registry() {
        let mut config = RelayConfig::default();
        config
            .apply_json(r#"{"registry": {"029095": {"label": "Jackson County, MO", "region": "MO"}}}"#)
            .unwrap();

        assert_eq!(config.registry.len(), 1);
        assert_eq!(config.registry.lookup("029095").unwrap().label, "Jackson County, MO");
    }

    #[test]
    fn test_apply_json_rejects_duplicates_and_unknown_keys() {
        let mut config = RelayConfig::default();
        let dup = r#"{"channels": [{"channel_id": 0, "prefix": "A"}, {"channel_id": 0, "prefix": "B"}]}"#;
        assert!(matches!(config.apply_json(dup), Err(RelayError::Policy(_))));
        assert!(matches!(config.apply_json(r#"{"chanels": []}"#), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_apply_file_missing() {
        let mut config = RelayConfig::default();
        let result = config.apply_file(Path::new("/nonexistent/channels.json"));
        assert!(matches!(result, Err(RelayError::ConfigFile { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" 1 "));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
    }
}
