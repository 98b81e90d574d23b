//! Infrastructure layer for chathub-server.
//!
//! The infrastructure layer handles all I/O: accepting WebSocket connections,
//! adapting them to the peer ports, and reading the config file.
//!
//! # Responsibilities
//!
//! - Binding a TCP listener and polling the shutdown flag
//! - Performing the WebSocket HTTP upgrade and path routing
//! - Implementing `PeerReader` / `PeerWriter` over tokio-tungstenite
//! - Loading `HubConfig` from TOML
//!
//! # What does NOT belong here?
//!
//! - Roster or broadcast rules (that is the application layer)
//! - Config validation rules (that is the domain layer)

pub mod config_file;
pub mod ws_peer;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use config_file::load_config;
pub use ws_server::{run_server, serve};
