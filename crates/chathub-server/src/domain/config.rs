//! Hub configuration types.
//!
//! [`HubConfig`] is the single source of truth for all runtime settings.  It
//! can be built from defaults, parsed from a TOML document, and then
//! overridden field by field from CLI arguments (see `main.rs`).
//!
//! # TOML schema
//!
//! Every key is optional; absent keys keep their default.
//!
//! ```toml
//! bind_addr = "0.0.0.0:8080"
//! ws_path = "/ws"
//! mailbox_capacity = 256
//! backpressure = "disconnect"   # or "drop_message", "block"
//! wire_format = "json"          # or "bincode"
//! ```

use std::net::SocketAddr;

use chathub_core::WireFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::policy::BackpressurePolicy;

/// Default number of encoded events a session may have queued.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed fine but is not usable.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// All runtime configuration for the hub and its WebSocket gateway.
///
/// # Example
///
/// ```rust
/// use chathub_server::domain::HubConfig;
///
/// let cfg = HubConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert_eq!(cfg.mailbox_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,

    /// Request path that is upgraded to a WebSocket.  Other paths get 404.
    pub ws_path: String,

    /// Capacity of each session's outbound mailbox.
    pub mailbox_capacity: usize,

    /// What the hub does when a mailbox is full.
    pub backpressure: BackpressurePolicy,

    /// Payload encoding for every event on this hub.
    pub wire_format: WireFormat,
}

impl Default for HubConfig {
    /// | Field            | Default          |
    /// |------------------|------------------|
    /// | bind_addr        | `127.0.0.1:8080` |
    /// | ws_path          | `/ws`            |
    /// | mailbox_capacity | 256              |
    /// | backpressure     | `disconnect`     |
    /// | wire_format      | `json`           |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            ws_path: "/ws".to_string(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            backpressure: BackpressurePolicy::default(),
            wire_format: WireFormat::default(),
        }
    }
}

impl HubConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] if a value fails [`HubConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// - `mailbox_capacity` must be at least 1 (a zero-sized mailbox could
    ///   never accept the handshake).
    /// - `ws_path` must start with `/`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "mailbox_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.ws_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "ws_path",
                reason: format!("'{}' must start with '/'", self.ws_path),
            });
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
