//! Sends messages by invoking the meshtastic CLI.

use std::process::Stdio;

use alert_core::ChannelId;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::error::TransportError;
use crate::sink::TransportSink;

/// Transport that shells out to `meshtastic --sendtext` once per message.
#[derive(Debug, Clone)]
pub struct MeshtasticCli {
    config: CliConfig,
}

impl MeshtasticCli {
    /// Create a CLI transport.
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CliConfig {
        &self.config
    }
}

#[async_trait]
impl TransportSink for MeshtasticCli {
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), TransportError> {
        let args = self.config.send_args(channel_id, text);
        debug!(program = %self.config.program, ?args, "Invoking meshtastic CLI");

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| TransportError::Timeout(self.config.timeout))?
            .map_err(|source| TransportError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransportError::Exit {
                program: self.config.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("Sent on channel {}: {}", channel_id, text);
        Ok(())
    }

    fn name(&self) -> &str {
        "meshtastic-cli"
    }
}
