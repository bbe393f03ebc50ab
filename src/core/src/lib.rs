//! A3S ctd Core - shared types for the containerd supervisor.
//!
//! Holds the error type and the supervisor configuration used by the
//! runtime and CLI crates.

pub mod config;
pub mod error;

pub use config::{CtdConfig, LogLevel, Snapshotter};
pub use error::{CtdError, Result};

/// a3s-ctd version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
