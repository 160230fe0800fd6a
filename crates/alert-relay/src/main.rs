use std::path::PathBuf;
use std::time::Duration;

use alert_core::Shutdown;
use alert_relay::{build_relay, shutdown_signal, RelayConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Relay NWS weather alerts onto Meshtastic channels.
#[derive(Debug, Parser)]
#[command(name = "alert-relay", version)]
struct Args {
    /// Log messages instead of sending them to the radio
    #[arg(long)]
    dry_run: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// JSON file with channel policies and/or county registry
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dedup state file
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Cross-process send lock file
    #[arg(long)]
    lock_file: Option<PathBuf>,

    /// Seconds between polls
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = RelayConfig::from_env()?;
    config.dry_run |= args.dry_run;
    config.run_once |= args.once;
    if let Some(path) = args.config {
        config.apply_file(&path)?;
    }
    if let Some(path) = args.state_file {
        config.state_file = path;
    }
    if let Some(path) = args.lock_file {
        config.lock_file = path;
    }
    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs);
    }

    if config.dry_run {
        info!("Dry run: messages will be logged, not sent");
    }

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Termination signal received");
        trigger.trigger();
    });

    let mut relay = build_relay(&config)?;

    if config.run_once {
        let summary = relay.run_cycle(&shutdown).await;
        info!(
            alerts = summary.alerts,
            messages = summary.messages,
            sent = summary.sent,
            "Single check complete"
        );
        relay.shutdown();
    } else {
        relay.run(shutdown).await;
    }

    Ok(())
}
