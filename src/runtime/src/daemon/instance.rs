//! A single supervised containerd process and its private directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use a3s_ctd_core::error::{CtdError, Result};
use a3s_ctd_core::CtdConfig;
use tokio::process::{Child, Command};

use super::binary::find_binary;
use super::config::{DaemonConfig, CONFIG_FILE, DEBUG_SOCKET, GRPC_SOCKET};
use super::sink::OutputSink;

/// Poll interval for [`DaemonInstance::wait_ready`].
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle state of a daemon instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    /// Process started (it may still be warming up).
    Running,
    /// Process killed and reaped; directory still present.
    Killed,
    /// Process gone and directory removed.
    Closed,
}

/// containerd running in an isolated temporary directory.
///
/// The process and the directory are one unit: [`close`](Self::close)
/// reclaims both. Dropping an instance without closing it kills the
/// process but leaves the directory behind.
#[derive(Debug)]
pub struct DaemonInstance {
    dir: PathBuf,
    child: Child,
    sink: OutputSink,
    state: DaemonState,
}

impl DaemonInstance {
    /// Start containerd with the default configuration.
    pub fn spawn(sink: OutputSink) -> Result<Self> {
        Self::create(&CtdConfig::default(), sink)
    }

    /// Start containerd in a fresh temporary directory.
    ///
    /// Writes `config.toml` into the directory and launches
    /// `<daemon> --config <dir>/config.toml` with stderr sent to `sink`.
    /// Returns as soon as the process has started; the daemon becomes ready
    /// asynchronously (see [`wait_ready`](Self::wait_ready)).
    ///
    /// On any failure the directory is removed before returning.
    /// Must be called from within a Tokio runtime.
    pub fn create(config: &CtdConfig, sink: OutputSink) -> Result<Self> {
        config.validate()?;

        let temp = tempfile::Builder::new()
            .prefix(&config.temp_prefix)
            .tempdir()
            .map_err(|e| {
                CtdError::DirectoryError(format!("failed to create temp directory: {}", e))
            })?;
        let dir = temp.path().to_path_buf();

        let config_path = dir.join(CONFIG_FILE);
        DaemonConfig::new(&dir, config.snapshotter(), config.debug_level).write(&config_path)?;

        let binary = find_binary(&config.daemon_binary, config.search_path.as_deref())
            .ok_or_else(|| CtdError::BinaryNotFound {
                binary: config.daemon_binary.clone(),
            })?;

        let start_error = |e: std::io::Error| CtdError::ProcessStartError {
            binary: binary.display().to_string(),
            message: e.to_string(),
        };

        let child = Command::new(&binary)
            .arg("--config")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(sink.stdio().map_err(start_error)?)
            .kill_on_drop(true)
            .spawn()
            .map_err(start_error)?;

        // From here on the directory is owned by the instance.
        let dir = temp.keep();

        tracing::info!(
            pid = child.id(),
            dir = %dir.display(),
            binary = %binary.display(),
            snapshotter = %config.snapshotter(),
            "containerd started"
        );

        Ok(Self {
            dir,
            child,
            sink,
            state: DaemonState::Running,
        })
    }

    /// Private working directory of this instance.
    pub fn work_dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the generated `config.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// containerd root (content store, metadata, snapshots).
    pub fn root_dir(&self) -> PathBuf {
        self.dir.join("root")
    }

    /// gRPC socket address.
    pub fn address(&self) -> PathBuf {
        self.dir.join(GRPC_SOCKET)
    }

    /// Debug socket address.
    pub fn debug_address(&self) -> PathBuf {
        self.dir.join(DEBUG_SOCKET)
    }

    /// Output sink shared by the daemon and fetches against it.
    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// OS process id, `None` once the process has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    /// Wait until the gRPC socket appears.
    ///
    /// Never called implicitly. Fails early if the daemon exits while
    /// starting up.
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<()> {
        let address = self.address();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if address.exists() {
                tracing::debug!(address = %address.display(), "containerd ready");
                return Ok(());
            }

            if let Some(status) = self.child.try_wait().map_err(|e| {
                CtdError::ProcessError(format!("failed to check containerd status: {}", e))
            })? {
                return Err(CtdError::ProcessError(format!(
                    "containerd exited during startup ({})",
                    status
                )));
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(CtdError::TimeoutError(format!(
                    "containerd socket {} did not appear within {:?}",
                    address.display(),
                    timeout
                )));
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Force-kill containerd and reap it. The directory is left in place.
    ///
    /// The exit status is ignored. Killing an already reaped process
    /// returns [`CtdError::ProcessError`].
    pub async fn kill(&mut self) -> Result<()> {
        // tokio reports success for a child it has already reaped.
        let pid = match self.child.id() {
            Some(pid) if self.state == DaemonState::Running => pid,
            _ => {
                return Err(CtdError::ProcessError(
                    "containerd already exited".to_string(),
                ))
            }
        };

        self.child.start_kill().map_err(|e| {
            CtdError::ProcessError(format!("failed to kill containerd: {}", e))
        })?;
        let _ = self.child.wait().await;

        self.state = DaemonState::Killed;

        tracing::info!(pid, dir = %self.dir.display(), "containerd killed");
        Ok(())
    }

    /// Kill containerd if still running, then remove the directory.
    ///
    /// If the kill fails the directory is kept and the error returned.
    /// Closing an already closed instance is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == DaemonState::Running {
            // Already reaped by wait_ready: the daemon exited on its own.
            if self.child.id().is_some() {
                self.kill().await?;
            } else {
                self.state = DaemonState::Killed;
            }
        }

        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CtdError::DirectoryError(format!(
                    "failed to remove {}: {}",
                    self.dir.display(),
                    e
                )));
            }
        }

        self.state = DaemonState::Closed;
        tracing::info!(dir = %self.dir.display(), "containerd instance closed");
        Ok(())
    }
}
