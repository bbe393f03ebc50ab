//! Supervisor configuration.
//!
//! Everything here has a working default, so a missing config file means
//! "look up `containerd` and `dist` on `$PATH`".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CtdError, Result};

/// Default file name under `~/.a3s`.
const CONFIG_FILE_NAME: &str = "ctd.yaml";

/// Supervisor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtdConfig {
    /// Daemon binary name or path
    pub daemon_binary: String,

    /// Fetch tool binary name or path
    pub fetch_binary: String,

    /// Prefix for the per-instance temporary directory
    pub temp_prefix: String,

    /// Search path used instead of `$PATH` (same syntax as `$PATH`)
    pub search_path: Option<String>,

    /// Snapshotter override (host default when unset)
    pub snapshotter: Option<Snapshotter>,

    /// Daemon debug log level
    pub debug_level: LogLevel,
}

impl Default for CtdConfig {
    fn default() -> Self {
        Self {
            daemon_binary: "containerd".to_string(),
            fetch_binary: "dist".to_string(),
            temp_prefix: "moby-ctd".to_string(),
            search_path: None,
            snapshotter: None,
            debug_level: LogLevel::Info,
        }
    }
}

impl CtdConfig {
    /// Load a config from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CtdError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: CtdConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config at `path`, or at `~/.a3s/ctd.yaml` when `path` is `None`.
    ///
    /// An explicit path must exist. The default path falls back to defaults
    /// when the file is absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_path = Self::default_path();
        if default_path.exists() {
            tracing::debug!(path = %default_path.display(), "Loading config");
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Path of the default config file (`~/.a3s/ctd.yaml`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".a3s"))
            .unwrap_or_else(|| PathBuf::from(".a3s"))
            .join(CONFIG_FILE_NAME)
    }

    /// Snapshotter to use: the override if set, else the host default.
    pub fn snapshotter(&self) -> Snapshotter {
        self.snapshotter.unwrap_or_else(Snapshotter::host_default)
    }

    /// Reject configs that cannot name a binary or a directory.
    pub fn validate(&self) -> Result<()> {
        if self.daemon_binary.trim().is_empty() {
            return Err(CtdError::ConfigError(
                "daemon_binary must not be empty".to_string(),
            ));
        }
        if self.fetch_binary.trim().is_empty() {
            return Err(CtdError::ConfigError(
                "fetch_binary must not be empty".to_string(),
            ));
        }
        if self.temp_prefix.is_empty() || self.temp_prefix.contains('/') {
            return Err(CtdError::ConfigError(format!(
                "invalid temp_prefix '{}'",
                self.temp_prefix
            )));
        }
        Ok(())
    }
}

/// Filesystem layering backend of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Snapshotter {
    /// Plain directory copies; works without overlayfs
    Naive,
    /// overlayfs
    Overlay,
}

impl Snapshotter {
    /// `naive` on macOS, `overlay` everywhere else.
    pub fn host_default() -> Self {
        if cfg!(target_os = "macos") {
            Snapshotter::Naive
        } else {
            Snapshotter::Overlay
        }
    }
}

impl std::fmt::Display for Snapshotter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Snapshotter::Naive => write!(f, "naive"),
            Snapshotter::Overlay => write!(f, "overlay"),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
