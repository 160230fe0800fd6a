//! Integration tests for the alert relay.
//!
//! The feed and the radio are replaced by in-memory fakes; the dedup store
//! and send lock use real files in a temp directory.
//!
//! Run:
//!   cargo test -p alert-relay --test integration_tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alert_core::{Alert, ChannelId, ChannelPolicySet, CodeRegistry, DeliveryLedger, Shutdown};
use alert_relay::Relay;
use async_trait::async_trait;
use broadcaster::{Broadcaster, Pacing, SendLock};
use cap_feed::{FeedError, FeedSource};
use chrono::Utc;
use dedup_store::DedupStore;
use mesh_transport::{TransportError, TransportSink};

// ============================================================================
// Fakes
// ============================================================================

/// Feed that replays queued responses, then returns nothing.
#[derive(Default)]
struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<Vec<Alert>, FeedError>>>,
}

impl ScriptedFeed {
    fn new(responses: Vec<Result<Vec<Alert>, FeedError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    fn repeating(alerts: Vec<Alert>, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(alerts.clone())).collect())
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, FeedError> {
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Records every send; fails all sends on `fail_channel` if set.
#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(ChannelId, String)>>,
    fail_channel: Option<ChannelId>,
}

impl RecordingSink {
    fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportSink for RecordingSink {
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError> {
        if self.fail_channel == Some(channel_id) {
            return Err(TransportError::Exit {
                program: "meshtastic".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "no radio".to_string(),
            });
        }
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn relay(dir: &Path, feed: ScriptedFeed, sink: Arc<RecordingSink>) -> Relay<ScriptedFeed> {
    let broadcaster = Broadcaster::new(sink, SendLock::new(dir.join("send.lock"))).with_pacing(Pacing::none());
    Relay::new(
        feed,
        broadcaster,
        ChannelPolicySet::default(),
        CodeRegistry::default(),
        DedupStore::open(dir.join("sent_alerts.json")),
    )
}

fn tornado(id: &str) -> Alert {
    Alert::new(id, "Tornado Warning")
        .with_expires("2024-05-01T10:00:00-05:00")
        .with_geo_codes(["029099"])
}

// ============================================================================
// Poll cycle
// ============================================================================

#[tokio::test]
async fn test_alert_relayed_once_per_channel() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut relay = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 2), sink.clone());

    let first = relay.run_cycle(&Shutdown::never()).await;
    assert_eq!(first.alerts, 1);
    assert_eq!(first.sent, 2);
    assert_eq!(
        sink.sent(),
        vec![
            (
                0,
                "MeshSTL Alert:\n⚠️ Tornado Warning for Jefferson County, MO until May 01, 10:00 AM".to_string()
            ),
            (
                1,
                "Local Alert:\n⚠️ Tornado Warning for Jefferson County, MO until May 01, 10:00 AM".to_string()
            ),
        ]
    );
    assert!(relay.store().has_notified("A1", 0));
    assert!(relay.store().has_notified("A1", 1));

    let second = relay.run_cycle(&Shutdown::never()).await;
    assert_eq!(second.alerts, 1);
    assert_eq!(second.messages, 0);
    assert_eq!(sink.sent().len(), 2);
    assert!(!dir.path().join("send.lock").exists());
}

#[tokio::test]
async fn test_empty_ids_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let first = tornado("");
    let second = Alert::new("", "Severe Thunderstorm Warning").with_geo_codes(["029099"]);
    let mut relay = relay(dir.path(), ScriptedFeed::repeating(vec![first, second], 1), sink.clone());

    relay.run_cycle(&Shutdown::never()).await;

    // Only the first empty-id alert gets through on each channel.
    let sent = sink.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(_, text)| text.contains("Tornado Warning")));
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let sink = Arc::new(RecordingSink::default());
    let mut first = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 1), sink.clone());
    first.run_cycle(&Shutdown::never()).await;
    assert_eq!(sink.sent().len(), 2);
    drop(first);

    let sink = Arc::new(RecordingSink::default());
    let mut second = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 1), sink.clone());
    let summary = second.run_cycle(&Shutdown::never()).await;

    assert_eq!(summary.messages, 0);
    assert!(sink.sent().is_empty());
}

#[tokio::test]
async fn test_feed_error_is_an_empty_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let feed = ScriptedFeed::new(vec![
        Err(FeedError::Config("upstream down".to_string())),
        Ok(vec![tornado("A1")]),
    ]);
    let mut relay = relay(dir.path(), feed, sink.clone());

    let failed = relay.run_cycle(&Shutdown::never()).await;
    assert_eq!(failed.alerts, 0);
    assert!(sink.sent().is_empty());
    assert!(dir.path().join("sent_alerts.json").exists());

    let recovered = relay.run_cycle(&Shutdown::never()).await;
    assert_eq!(recovered.sent, 2);
}

#[tokio::test]
async fn test_transport_failure_does_not_stop_other_channels() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink {
        fail_channel: Some(0),
        ..Default::default()
    });
    let mut relay = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 2), sink.clone());

    let summary = relay.run_cycle(&Shutdown::never()).await;

    assert_eq!(summary.failed_channels, 1);
    assert_eq!(sink.sent().len(), 1);
    assert_eq!(sink.sent()[0].0, 1);
    // Recorded before delivery, so the failed channel is not retried.
    assert!(relay.store().has_notified("A1", 0));
    let again = relay.run_cycle(&Shutdown::never()).await;
    assert_eq!(again.messages, 0);
}

#[tokio::test]
async fn test_expired_records_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("sent_alerts.json");

    let mut old = DedupStore::empty(&state);
    old.record("OLD", 0, Utc::now() - chrono::Duration::days(10));
    old.record("RECENT", 0, Utc::now() - chrono::Duration::hours(1));
    old.persist().unwrap();

    let mut relay = relay(dir.path(), ScriptedFeed::default(), Arc::new(RecordingSink::default()));
    let summary = relay.run_cycle(&Shutdown::never()).await;

    assert_eq!(summary.pruned, 1);
    let reloaded = DedupStore::open(&state);
    assert!(reloaded.get("OLD").is_none());
    assert!(reloaded.get("RECENT").is_some());
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_before_cycle_skips_channels_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut relay = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 1), sink.clone());

    let (trigger, shutdown) = Shutdown::channel();
    trigger.trigger();
    let summary = relay.run_cycle(&shutdown).await;

    assert!(summary.interrupted);
    assert!(sink.sent().is_empty());
    assert!(dir.path().join("sent_alerts.json").exists());
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_shutdown_and_saves_state() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let relay = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 5), sink.clone())
        .with_poll_interval(Duration::from_secs(60));

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(90)).await;
        trigger.trigger();
    });

    let store = relay.run(shutdown).await;

    // Two cycles ran (t=0, t=60); the alert went out once per channel.
    assert_eq!(sink.sent().len(), 2);
    assert!(store.has_notified("A1", 0));
    let reloaded = DedupStore::open(dir.path().join("sent_alerts.json"));
    assert!(reloaded.has_notified("A1", 1));
}

#[tokio::test]
async fn test_clear_on_exit_wipes_state() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut relay = relay(dir.path(), ScriptedFeed::repeating(vec![tornado("A1")], 1), sink)
        .with_clear_on_exit(true);

    relay.run_cycle(&Shutdown::never()).await;
    let store = relay.shutdown();

    assert!(store.is_empty());
    assert!(DedupStore::open(dir.path().join("sent_alerts.json")).is_empty());
}
