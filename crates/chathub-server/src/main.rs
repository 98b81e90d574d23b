//! ChatHub server: entry point.
//!
//! Accepts WebSocket connections on `/ws` and relays chat events between
//! every connected client, keeping a shared roster of logged-in users.
//!
//! # Usage
//!
//! ```text
//! chathub-server [OPTIONS]
//!
//! Options:
//!   --bind <IP>                  Listener IP address       [default: 127.0.0.1]
//!   --port <PORT>                Listener port             [default: 8080]
//!   --ws-path <PATH>             WebSocket endpoint path   [default: /ws]
//!   --mailbox-capacity <N>       Per-session queue length  [default: 256]
//!   --backpressure <POLICY>      disconnect | drop-message | block
//!   --wire-format <FORMAT>       json | bincode
//!   --config <FILE>              TOML config file
//! ```
//!
//! # Precedence
//!
//! CLI argument, then `CHATHUB_*` environment variable, then the config file,
//! then the built-in default.
//!
//! | Variable                   | Default          |
//! |----------------------------|------------------|
//! | `CHATHUB_BIND`             | `127.0.0.1`      |
//! | `CHATHUB_PORT`             | `8080`           |
//! | `CHATHUB_WS_PATH`          | `/ws`            |
//! | `CHATHUB_MAILBOX_CAPACITY` | `256`            |
//! | `CHATHUB_BACKPRESSURE`     | `disconnect`     |
//! | `CHATHUB_WIRE_FORMAT`      | `json`           |
//! | `CHATHUB_CONFIG`           | (none)           |

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use chathub_core::WireFormat;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chathub_server::domain::{BackpressurePolicy, HubConfig};
use chathub_server::infrastructure::{load_config, run_server};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// ChatHub WebSocket broadcast server.
///
/// Every option is optional so that an absent flag falls through to the
/// config file instead of overriding it with a clap default.
#[derive(Debug, Parser)]
#[command(
    name = "chathub-server",
    about = "Real-time WebSocket chat hub with a shared roster",
    version
)]
struct Cli {
    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept connections from any interface.
    #[arg(long, env = "CHATHUB_BIND")]
    bind: Option<IpAddr>,

    /// TCP port to listen on.
    #[arg(long, env = "CHATHUB_PORT")]
    port: Option<u16>,

    /// Request path upgraded to a WebSocket; other paths get 404.
    #[arg(long, env = "CHATHUB_WS_PATH")]
    ws_path: Option<String>,

    /// Number of encoded events a session may have queued.
    #[arg(long, env = "CHATHUB_MAILBOX_CAPACITY")]
    mailbox_capacity: Option<usize>,

    /// What to do when a session's queue is full.
    #[arg(long, env = "CHATHUB_BACKPRESSURE")]
    backpressure: Option<BackpressurePolicy>,

    /// Payload encoding: `json` (text frames) or `bincode` (binary frames).
    #[arg(long, env = "CHATHUB_WIRE_FORMAT")]
    wire_format: Option<WireFormat>,

    /// TOML config file.  Values given on the command line win.
    #[arg(long, env = "CHATHUB_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges CLI values over the config file (if any) over defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the merged
    /// result fails validation.
    fn into_hub_config(self) -> anyhow::Result<HubConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => HubConfig::default(),
        };

        if let Some(ip) = self.bind {
            config.bind_addr.set_ip(ip);
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(ws_path) = self.ws_path {
            config.ws_path = ws_path;
        }
        if let Some(capacity) = self.mailbox_capacity {
            config.mailbox_capacity = capacity;
        }
        if let Some(policy) = self.backpressure {
            config.backpressure = policy;
        }
        if let Some(format) = self.wire_format {
            config.wire_format = format;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` selects the level; `info` when unset or invalid.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_hub_config()?;

    info!(
        "ChatHub starting: bind={}, path={}",
        config.bind_addr, config.ws_path
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("ChatHub stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["chathub-server"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_no_arguments_yield_default_config() {
        // Arrange
        let cli = parse(&[]);

        // Act
        let config = cli.into_hub_config().unwrap();

        // Assert
        assert_eq!(config, HubConfig::default());
    }

    #[test]
    fn test_port_override_keeps_default_ip() {
        let config = parse(&["--port", "9001"]).into_hub_config().unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9001");
    }

    #[test]
    fn test_bind_override_keeps_default_port() {
        let config = parse(&["--bind", "0.0.0.0"]).into_hub_config().unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_policy_and_format_flags_parse() {
        let config = parse(&["--backpressure", "drop-message", "--wire-format", "bincode"])
            .into_hub_config()
            .unwrap();
        assert_eq!(config.backpressure, BackpressurePolicy::DropMessage);
        assert_eq!(config.wire_format, WireFormat::Bincode);
    }

    #[test]
    fn test_invalid_bind_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["chathub-server", "--bind", "not.an.ip"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_policy_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["chathub-server", "--backpressure", "retry"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_mailbox_capacity_fails_validation() {
        let result = parse(&["--mailbox-capacity", "0"]).into_hub_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        // Arrange: a config file that sets port and path
        let dir = std::env::temp_dir().join(format!("chathub_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chathub.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:7000\"\nws_path = \"/chat\"\n").unwrap();

        // Act
        let config = parse(&["--config", path.to_str().unwrap(), "--port", "7100"])
            .into_hub_config()
            .unwrap();

        // Assert: file path kept, CLI port wins
        assert_eq!(config.ws_path, "/chat");
        assert_eq!(config.bind_addr.port(), 7100);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = parse(&["--config", "/nonexistent/chathub.toml"]).into_hub_config();
        assert!(result.is_err());
    }
}
