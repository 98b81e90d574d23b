//! Loads [`HubConfig`] from a TOML file on disk.
//!
//! The file is optional: `main.rs` only calls [`load_config`] when
//! `--config` (or `CHATHUB_CONFIG`) names one, and a named file that does not
//! exist is an error rather than a silent fallback to defaults.

use std::path::Path;

use tracing::debug;

use crate::domain::config::{ConfigError, HubConfig};

/// Reads, parses and validates the config file at `path`.
///
/// # Errors
///
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Parse`] for malformed TOML or unknown keys.
/// - [`ConfigError::Invalid`] if a value fails validation.
pub fn load_config(path: &Path) -> Result<HubConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = HubConfig::from_toml_str(&content)?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}
