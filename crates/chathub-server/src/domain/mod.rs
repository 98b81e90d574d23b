//! Domain layer for chathub-server.
//!
//! The domain layer contains pure business-logic types that have no
//! dependencies on I/O, networking, or the async runtime.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures and their validation rules
//! - Policy values that change how the hub behaves (backpressure)
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod policy;

// Re-export so callers can write `domain::HubConfig` instead of the longer path.
pub use config::{ConfigError, HubConfig};
pub use policy::BackpressurePolicy;
