//! Image fetch through the external `dist` tool.
//!
//! `dist` talks to the instance over its gRPC socket and writes content
//! into the instance root. Its output goes to the instance's sink.

use std::ffi::OsString;
use std::process::Stdio;

use a3s_ctd_core::error::{CtdError, Result};
use a3s_ctd_core::CtdConfig;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::daemon::{find_binary, DaemonInstance};
use crate::oci::normalize;

/// Runs `dist fetch` against a daemon instance.
#[derive(Debug, Clone)]
pub struct Fetcher {
    binary: String,
    search_path: Option<String>,
}

impl Fetcher {
    pub fn new(config: &CtdConfig) -> Self {
        Self {
            binary: config.fetch_binary.clone(),
            search_path: config.search_path.clone(),
        }
    }

    /// Fetch `reference` into the instance's content store.
    ///
    /// Blocks until `dist` exits. There is no timeout; use
    /// [`fetch_with_cancel`](Self::fetch_with_cancel) to bound the wait.
    ///
    /// `trust` is accepted but not yet passed to `dist`.
    pub async fn fetch(&self, instance: &DaemonInstance, reference: &str, trust: bool) -> Result<()> {
        self.fetch_with_cancel(instance, reference, trust, &CancellationToken::new())
            .await
    }

    /// Like [`fetch`](Self::fetch), but kills `dist` when `cancel` fires.
    pub async fn fetch_with_cancel(
        &self,
        instance: &DaemonInstance,
        reference: &str,
        trust: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let binary = find_binary(&self.binary, self.search_path.as_deref()).ok_or_else(|| {
            CtdError::BinaryNotFound {
                binary: self.binary.clone(),
            }
        })?;

        let image = normalize(reference);
        tracing::debug!(image = %image, "fetch");
        if trust {
            tracing::warn!(image = %image, "Trust verification not yet implemented, fetching unverified");
        }

        let stdio_error =
            |e: std::io::Error| CtdError::FetchError(format!("failed to attach output: {}", e));

        let mut child = Command::new(&binary)
            .args(fetch_args(instance, &image))
            .stdin(Stdio::null())
            .stdout(instance.sink().stdio().map_err(stdio_error)?)
            .stderr(instance.sink().stdio().map_err(stdio_error)?)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CtdError::FetchError(format!("failed to spawn {}: {}", binary.display(), e))
            })?;

        let outcome = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        let status = match outcome {
            Some(status) => status.map_err(|e| {
                CtdError::FetchError(format!("failed to wait for {}: {}", binary.display(), e))
            })?,
            None => {
                let _ = child.kill().await;
                tracing::info!(image = %image, "fetch cancelled");
                return Err(CtdError::FetchError(format!("fetch of {} cancelled", image)));
            }
        };

        if !status.success() {
            return Err(CtdError::FetchError(format!(
                "{} fetch {} failed: {}",
                self.binary, image, status
            )));
        }

        tracing::info!(image = %image, "Fetched image");
        Ok(())
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(&CtdConfig::default())
    }
}

/// `--address <dir>/containerd.sock --root <dir>/root fetch <image>`
fn fetch_args(instance: &DaemonInstance, image: &str) -> Vec<OsString> {
    vec![
        "--address".into(),
        instance.address().into_os_string(),
        "--root".into(),
        instance.root_dir().into_os_string(),
        "fetch".into(),
        image.into(),
    ]
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::daemon::OutputSink;
    use crate::test_support::{fake_tool, test_config};
    use std::time::Duration;

    /// Records its arguments and drops a blob into `--root`.
    const RECORDING_DIST: &str = r#"echo "$@" > "$(dirname "$4")/dist.args"
mkdir -p "$4/io.containerd.content.v1.content/blobs/sha256"
printf 'layer' > "$4/io.containerd.content.v1.content/blobs/sha256/abc""#;

    fn setup(dist_body: &str) -> (tempfile::TempDir, CtdConfig) {
        let bin = tempfile::tempdir().unwrap();
        fake_tool(bin.path(), "containerd", "exec sleep 60");
        fake_tool(bin.path(), "dist", dist_body);
        let config = test_config(bin.path());
        (bin, config)
    }

    #[tokio::test]
    async fn test_fetch_invokes_dist() {
        let (_bin, config) = setup(RECORDING_DIST);
        let mut daemon = DaemonInstance::create(&config, OutputSink::Null).unwrap();

        Fetcher::new(&config)
            .fetch(&daemon, "alpine", false)
            .await
            .unwrap();

        let args = std::fs::read_to_string(daemon.work_dir().join("dist.args")).unwrap();
        assert_eq!(
            args.trim(),
            format!(
                "--address {} --root {} fetch docker.io/library/alpine:latest",
                daemon.address().display(),
                daemon.root_dir().display()
            )
        );
        assert!(daemon.root_dir().is_dir());

        daemon.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_keeps_qualified_reference() {
        let (_bin, config) = setup(RECORDING_DIST);
        let mut daemon = DaemonInstance::create(&config, OutputSink::Null).unwrap();

        Fetcher::new(&config)
            .fetch(&daemon, "docker.io/library/alpine:3.5", true)
            .await
            .unwrap();

        let args = std::fs::read_to_string(daemon.work_dir().join("dist.args")).unwrap();
        assert!(args.trim().ends_with("fetch docker.io/library/alpine:3.5"));

        daemon.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_nonzero_exit() {
        let (_bin, config) = setup("echo 'unauthorized' >&2\nexit 3");
        let mut daemon = DaemonInstance::create(&config, OutputSink::Null).unwrap();

        let err = Fetcher::new(&config)
            .fetch(&daemon, "alpine", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CtdError::FetchError(_)));
        assert!(err.to_string().contains("docker.io/library/alpine:latest"));

        daemon.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_missing_dist() {
        let bin = tempfile::tempdir().unwrap();
        fake_tool(bin.path(), "containerd", "exec sleep 60");
        let config = test_config(bin.path());
        let mut daemon = DaemonInstance::create(&config, OutputSink::Null).unwrap();

        let err = Fetcher::new(&config)
            .fetch(&daemon, "alpine", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CtdError::BinaryNotFound { .. }));
        assert_eq!(err.to_string(), "Cannot find dist in path");

        daemon.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_output_goes_to_sink() {
        let (_bin, config) = setup("echo out\necho err >&2");
        let logs = tempfile::tempdir().unwrap();
        let log_path = logs.path().join("ctd.log");
        let sink = OutputSink::append_to(&log_path).unwrap();
        let mut daemon = DaemonInstance::create(&config, sink).unwrap();

        Fetcher::new(&config)
            .fetch(&daemon, "alpine", false)
            .await
            .unwrap();

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("out\n"));
        assert!(log.contains("err\n"));

        daemon.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_cancelled() {
        let (_bin, config) = setup("exec sleep 60");
        let mut daemon = DaemonInstance::create(&config, OutputSink::Null).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let fetcher = Fetcher::new(&config);
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            fetcher.fetch_with_cancel(&daemon, "alpine", false, &cancel),
        )
        .await
        .expect("cancelled fetch should return promptly");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("cancelled"));

        daemon.close().await.unwrap();
    }

    #[test]
    fn test_default_fetcher_uses_dist() {
        let fetcher = Fetcher::default();
        assert_eq!(fetcher.binary, "dist");
        assert!(fetcher.search_path.is_none());
    }
}
