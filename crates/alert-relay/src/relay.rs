//! The poll loop: fetch, classify per channel, deliver, prune, persist, sleep.

use std::time::Duration;

use alert_core::{classify, Alert, ChannelPolicySet, CodeRegistry, Shutdown};
use broadcaster::Broadcaster;
use cap_feed::FeedSource;
use chrono::Utc;
use dedup_store::DedupStore;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_POLL_SECS, DEFAULT_RETENTION_HOURS};

/// What one poll cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Alerts returned by the feed.
    pub alerts: usize,
    /// Messages produced by classification.
    pub messages: usize,
    /// Messages the transport accepted.
    pub sent: usize,
    /// Channels whose batch failed or was cut short.
    pub failed_channels: usize,
    /// Dedup records removed by pruning.
    pub pruned: usize,
    /// Shutdown was requested during the cycle.
    pub interrupted: bool,
}

/// Owns the dedup store and drives poll cycles until shutdown.
pub struct Relay<F: FeedSource> {
    feed: F,
    broadcaster: Broadcaster,
    policies: ChannelPolicySet,
    registry: CodeRegistry,
    store: DedupStore,
    poll_interval: Duration,
    retention: Duration,
    clear_on_exit: bool,
}

impl<F: FeedSource> Relay<F> {
    /// Create a relay with default interval and retention.
    pub fn new(
        feed: F,
        broadcaster: Broadcaster,
        policies: ChannelPolicySet,
        registry: CodeRegistry,
        store: DedupStore,
    ) -> Self {
        Self {
            feed,
            broadcaster,
            policies,
            registry,
            store,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            retention: Duration::from_secs(DEFAULT_RETENTION_HOURS * 3600),
            clear_on_exit: false,
        }
    }

    /// Set the delay between poll cycles.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set how long an untouched dedup record is kept.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Wipe dedup state on shutdown instead of keeping it.
    pub fn with_clear_on_exit(mut self, clear_on_exit: bool) -> Self {
        self.clear_on_exit = clear_on_exit;
        self
    }

    /// The dedup store.
    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// Consume the relay, returning its store.
    pub fn into_store(self) -> DedupStore {
        self.store
    }

    /// Run one full cycle without the trailing sleep.
    ///
    /// Feed failures are logged and treated as an empty alert list; a failed
    /// batch on one channel does not stop the others. The store is pruned and
    /// persisted on every path, including shutdown.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> CycleSummary {
        let mut summary = CycleSummary::default();

        let alerts = tokio::select! {
            biased;
            () = shutdown.wait() => {
                summary.interrupted = true;
                Vec::new()
            }
            result = self.feed.fetch_alerts() => match result {
                Ok(alerts) => alerts,
                Err(e) => {
                    error!("Error fetching CAP alerts: {}", e);
                    Vec::new()
                }
            },
        };
        summary.alerts = alerts.len();
        debug!(count = alerts.len(), "Fetched alerts");

        if !summary.interrupted {
            self.deliver_all(&alerts, shutdown, &mut summary).await;
        }

        summary.pruned = self.store.prune(Utc::now(), self.retention);
        if summary.pruned > 0 {
            info!(removed = summary.pruned, "Pruned expired dedup records");
        }
        self.persist();

        summary
    }

    async fn deliver_all(&mut self, alerts: &[Alert], shutdown: &Shutdown, summary: &mut CycleSummary) {
        for policy in self.policies.iter() {
            if shutdown.is_triggered() {
                summary.interrupted = true;
                break;
            }

            let now = Utc::now();
            let messages: Vec<_> = alerts
                .iter()
                .flat_map(|alert| classify(alert, policy, &mut self.store, &self.registry, now))
                .collect();
            summary.messages += messages.len();

            if messages.is_empty() {
                continue;
            }

            match self.broadcaster.deliver(policy.channel_id, &messages, shutdown).await {
                Ok(report) => {
                    summary.sent += report.sent;
                    if report.interrupted {
                        summary.interrupted = true;
                    }
                    if !report.is_complete() {
                        summary.failed_channels += 1;
                    }
                }
                Err(e) => {
                    error!(channel = policy.channel_id, "Delivery failed: {}", e);
                    summary.failed_channels += 1;
                }
            }
        }
    }

    /// Poll until `shutdown` fires, then save state and return.
    pub async fn run(mut self, shutdown: Shutdown) -> DedupStore {
        info!(
            channels = self.policies.len(),
            interval_secs = self.poll_interval.as_secs(),
            sink = self.broadcaster.sink().name(),
            "Starting alert relay"
        );

        loop {
            let summary = self.run_cycle(&shutdown).await;
            if summary.interrupted || shutdown.is_triggered() {
                break;
            }

            info!(
                alerts = summary.alerts,
                sent = summary.sent,
                "Check complete, sleeping for {} seconds",
                self.poll_interval.as_secs()
            );
            if !shutdown.sleep(self.poll_interval).await {
                break;
            }
        }

        info!("Shutdown signal received, saving state");
        self.shutdown()
    }

    /// Final save; wipes the store first when configured to.
    pub fn shutdown(mut self) -> DedupStore {
        if self.clear_on_exit {
            self.store.clear();
        }
        self.persist();
        self.store
    }

    fn persist(&self) {
        if let Err(e) = self.store.persist() {
            warn!(path = %self.store.path().display(), "Failed to save dedup state: {}", e);
        }
    }
}

impl<F: FeedSource> std::fmt::Debug for Relay<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("broadcaster", &self.broadcaster)
            .field("channels", &self.policies.channel_ids())
            .field("store", &self.store.path())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
