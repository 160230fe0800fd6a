//! Configuration types for mesh-transport.

use std::env;
use std::time::Duration;

use alert_core::ChannelId;

use crate::error::TransportError;

/// Default CLI executable.
pub const DEFAULT_PROGRAM: &str = "meshtastic";

/// Broadcast destination understood by the meshtastic CLI.
pub const BROADCAST_DEST: &str = "^all";

/// How the meshtastic CLI reaches the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeConnection {
    /// Let the CLI auto-detect a serial device.
    Auto,
    /// Network-attached node (`--host`).
    Host(String),
    /// Explicit serial device (`--port`).
    Serial(String),
}

/// Configuration for invoking the meshtastic CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Executable name or path.
    pub program: String,
    /// Destination node id, `^all` for broadcast.
    pub destination: String,
    /// How to reach the node.
    pub connection: NodeConnection,
    /// Upper bound on a single CLI invocation.
    pub timeout: Duration,
}

impl CliConfig {
    /// Create a configuration for the given executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Set the destination node.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Set how the node is reached.
    pub fn with_connection(mut self, connection: NodeConnection) -> Self {
        self.connection = connection;
        self
    }

    /// Set the invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `MESHTASTIC_BIN` - Default: meshtastic
    /// - `MESHTASTIC_DEST` - Default: ^all
    /// - `MESHTASTIC_HOST` - TCP host of a network node
    /// - `MESHTASTIC_PORT` - Serial device path (ignored when a host is set)
    /// - `MESHTASTIC_TIMEOUT_SECS` - Default: 60
    pub fn from_env() -> Result<Self, TransportError> {
        let mut config = Self::default();

        if let Ok(program) = env::var("MESHTASTIC_BIN") {
            config.program = program;
        }
        if let Ok(dest) = env::var("MESHTASTIC_DEST") {
            config.destination = dest;
        }

        config.connection = match (env::var("MESHTASTIC_HOST"), env::var("MESHTASTIC_PORT")) {
            (Ok(host), _) if !host.is_empty() => NodeConnection::Host(host),
            (_, Ok(port)) if !port.is_empty() => NodeConnection::Serial(port),
            _ => NodeConnection::Auto,
        };

        if let Ok(secs) = env::var("MESHTASTIC_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                TransportError::Config(format!("Invalid MESHTASTIC_TIMEOUT_SECS: {}", e))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Arguments for sending `text` on `channel_id`.
    pub fn send_args(&self, channel_id: ChannelId, text: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(8);
        match &self.connection {
            NodeConnection::Auto => {}
            NodeConnection::Host(host) => {
                args.push("--host".to_string());
                args.push(host.clone());
            }
            NodeConnection::Serial(port) => {
                args.push("--port".to_string());
                args.push(port.clone());
            }
        }
        args.push("--sendtext".to_string());
        args.push(text.to_string());
        args.push("--ch-index".to_string());
        args.push(channel_id.to_string());
        args.push("--dest".to_string());
        args.push(self.destination.clone());
        args
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            destination: BROADCAST_DEST.to_string(),
            connection: NodeConnection::Auto,
            timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let config = CliConfig::default();
        assert_eq!(
            config.send_args(1, "hello"),
            vec!["--sendtext", "hello", "--ch-index", "1", "--dest", "^all"]
        );
    }

    #[test]
    fn test_host_args() {
        let config = CliConfig::new("/usr/local/bin/meshtastic")
            .with_connection(NodeConnection::Host("192.168.1.40".to_string()))
            .with_destination("!a1b2c3d4");
        let args = config.send_args(0, "multi\nline");

        assert_eq!(&args[..2], &["--host", "192.168.1.40"]);
        assert_eq!(args[3], "multi\nline");
        assert_eq!(args.last().unwrap(), "!a1b2c3d4");
    }

    #[test]
    fn test_serial_args() {
        let config = CliConfig::default()
            .with_connection(NodeConnection::Serial("/dev/ttyUSB0".to_string()));
        assert_eq!(&config.send_args(2, "x")[..2], &["--port", "/dev/ttyUSB0"]);
    }
}
