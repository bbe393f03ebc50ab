//! containerd `config.toml` generation.
//!
//! Every path in the document lives under the instance directory, so two
//! instances never share state, sockets, or content.

use std::io::Write;
use std::path::{Path, PathBuf};

use a3s_ctd_core::error::{CtdError, Result};
use a3s_ctd_core::{LogLevel, Snapshotter};
use serde::{Deserialize, Serialize};

/// File name of the generated config inside the instance directory.
pub const CONFIG_FILE: &str = "config.toml";

/// File name of the gRPC socket inside the instance directory.
pub const GRPC_SOCKET: &str = "containerd.sock";

/// File name of the debug socket inside the instance directory.
pub const DEBUG_SOCKET: &str = "debug.sock";

/// Top-level containerd daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub state: PathBuf,
    pub root: PathBuf,
    pub snapshotter: Snapshotter,
    pub subreaper: bool,
    pub oom_score: i32,
    pub grpc: GrpcConfig,
    pub debug: DebugConfig,
    pub metrics: MetricsConfig,
}

/// `[grpc]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrpcConfig {
    pub address: PathBuf,
    pub uid: i32,
    pub gid: i32,
}

/// `[debug]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    pub address: PathBuf,
    pub level: LogLevel,
}

/// `[metrics]` section. An empty address disables the endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub address: String,
}

impl DaemonConfig {
    /// Build the config for an instance rooted at `dir`.
    pub fn new(dir: &Path, snapshotter: Snapshotter, level: LogLevel) -> Self {
        Self {
            state: dir.join("state"),
            root: dir.join("root"),
            snapshotter,
            subreaper: false,
            oom_score: 0,
            grpc: GrpcConfig {
                address: dir.join(GRPC_SOCKET),
                uid: -1,
                gid: -1,
            },
            debug: DebugConfig {
                address: dir.join(DEBUG_SOCKET),
                level,
            },
            metrics: MetricsConfig::default(),
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| CtdError::ConfigWriteError(format!("failed to render config: {}", e)))
    }

    /// Write the rendered config to `path`, readable by the owner only.
    ///
    /// Fails if `path` already exists.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(|e| {
            CtdError::ConfigWriteError(format!("failed to create {}: {}", path.display(), e))
        })?;
        file.write_all(content.as_bytes()).map_err(|e| {
            CtdError::ConfigWriteError(format!("failed to write {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}
