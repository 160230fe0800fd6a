//! Configuration types for cap-feed.

use std::env;
use std::time::Duration;

use crate::error::FeedError;

/// Default NWS API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.weather.gov";

/// Default User-Agent; api.weather.gov rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = "MeshtasticCAPFetcher";

/// Configuration for polling the CAP feed.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the alerts API (e.g., "https://api.weather.gov").
    pub base_url: String,
    /// Area codes (states / marine zones) to fetch, in order.
    pub areas: Vec<String>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl FeedConfig {
    /// Create a configuration for the given areas against the default API.
    pub fn new<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            areas: areas.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `CAP_API_URL` - Default: https://api.weather.gov
    /// - `CAP_AREAS` - Comma-separated area codes. Default: MO,IL
    /// - `CAP_USER_AGENT` - Default: MeshtasticCAPFetcher
    /// - `CAP_TIMEOUT_SECS` - Default: 30
    pub fn from_env() -> Result<Self, FeedError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("CAP_API_URL") {
            config.base_url = url;
        }

        if let Ok(areas) = env::var("CAP_AREAS") {
            config.areas = parse_areas(&areas);
            if config.areas.is_empty() {
                return Err(FeedError::Config("CAP_AREAS lists no areas".to_string()));
            }
        }

        if let Ok(agent) = env::var("CAP_USER_AGENT") {
            config.user_agent = agent;
        }

        if let Ok(secs) = env::var("CAP_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|e| FeedError::Config(format!("Invalid CAP_TIMEOUT_SECS: {}", e)))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Active-alerts URL for one area.
    pub fn area_url(&self, area: &str) -> String {
        format!(
            "{}/alerts/active?area={}",
            self.base_url.trim_end_matches('/'),
            area
        )
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            areas: vec!["MO".to_string(), "IL".to_string()],
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

fn parse_areas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|area| area.trim().to_ascii_uppercase())
        .filter(|area| !area.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.areas, vec!["MO", "IL"]);
        assert_eq!(config.user_agent, "MeshtasticCAPFetcher");
    }

    #[test]
    fn test_area_url() {
        let config = FeedConfig::new(["MO"]).with_base_url("http://localhost:9000/");
        assert_eq!(
            config.area_url("MO"),
            "http://localhost:9000/alerts/active?area=MO"
        );
    }

    #[test]
    fn test_parse_areas() {
        assert_eq!(parse_areas(" mo, IL ,,ks"), vec!["MO", "IL", "KS"]);
        assert!(parse_areas(" , ").is_empty());
    }
}
