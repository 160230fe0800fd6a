//! HTTP client for the NWS active-alerts endpoint.

use alert_core::Alert;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::types::FeatureCollection;
use crate::FeedSource;

/// Client for the CAP alerts API.
#[derive(Clone)]
pub struct CapClient {
    http: Client,
    config: FeedConfig,
}

impl CapClient {
    /// Build a client from configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        if config.areas.is_empty() {
            return Err(FeedError::Config("no feed areas configured".to_string()));
        }

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(FeedError::Http)?;

        info!(areas = ?config.areas, base_url = %config.base_url, "CAP feed client ready");
        Ok(Self { http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch the active alerts for one area.
    pub async fn fetch_area(&self, area: &str) -> Result<Vec<Alert>, FeedError> {
        let url = self.config.area_url(area);
        debug!("Fetching alerts from: {}", url);

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let collection: FeatureCollection = serde_json::from_slice(&body)?;
        let alerts = collection.into_alerts(Utc::now());

        debug!(area, count = alerts.len(), "Fetched alerts");
        Ok(alerts)
    }
}

#[async_trait]
impl FeedSource for CapClient {
    /// All configured areas, concatenated in order. Any area failing fails the fetch.
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, FeedError> {
        let mut alerts = Vec::new();
        for area in &self.config.areas {
            alerts.extend(self.fetch_area(area).await?);
        }
        Ok(alerts)
    }
}

impl std::fmt::Debug for CapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapClient")
            .field("config", &self.config)
            .finish()
    }
}
