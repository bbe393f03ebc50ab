//! CLI command definitions and dispatch.

mod bundle;
mod fetch;
mod normalize;
mod store;
mod version;

use std::path::PathBuf;
use std::time::Duration;

use a3s_ctd_core::CtdConfig;
use a3s_ctd_runtime::{DaemonInstance, OutputSink};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

/// A3S ctd — fetch images into a throwaway containerd and archive its store.
#[derive(Parser)]
#[command(name = "a3s-ctd", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Supervisor config file (default: ~/.a3s/ctd.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Seconds to wait for the containerd socket before running (0 = don't wait)
    #[arg(long, global = true, default_value_t = 10)]
    pub warmup: u64,

    /// Append containerd and dist output to this file instead of stderr
    #[arg(long, global = true)]
    pub daemon_log: Option<PathBuf>,
}

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Fetch images into a temporary containerd
    Fetch(fetch::FetchArgs),
    /// Fetch images and archive the content store as tar
    Store(store::StoreArgs),
    /// Build a bundle tar (image name + config.json) and fetch its image
    Bundle(bundle::BundleArgs),
    /// Print the fully qualified form of an image name
    Normalize(normalize::NormalizeArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
///
/// Commands that start containerd get a Ctrl-C token registered before the
/// daemon exists, so an interrupt at any point still closes the instance.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Fetch(args) => fetch::execute(&cli.global, args, cancel_on_ctrl_c()).await,
        Command::Store(args) => store::execute(&cli.global, args, cancel_on_ctrl_c()).await,
        Command::Bundle(args) => bundle::execute(&cli.global, args, cancel_on_ctrl_c()).await,
        Command::Normalize(args) => normalize::execute(args).await,
        Command::Version(args) => version::execute(args).await,
    }
}

/// Load config and start containerd, waiting for its socket if requested.
///
/// A cancelled warm-up closes the instance before returning.
pub(crate) async fn start_daemon(
    global: &GlobalArgs,
    cancel: &CancellationToken,
) -> Result<(CtdConfig, DaemonInstance), Box<dyn std::error::Error>> {
    let config = CtdConfig::load_or_default(global.config.as_deref())?;

    let sink = match &global.daemon_log {
        Some(path) => OutputSink::append_to(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?,
        None => OutputSink::Stderr,
    };

    let mut daemon = DaemonInstance::create(&config, sink)?;

    if global.warmup > 0 {
        let warmup = Duration::from_secs(global.warmup);
        let ready: Result<(), Box<dyn std::error::Error>> = tokio::select! {
            r = daemon.wait_ready(warmup) => r.map_err(Into::into),
            _ = cancel.cancelled() => Err("interrupted while waiting for containerd".into()),
        };

        if let Err(e) = ready {
            if let Err(close_err) = daemon.close().await {
                tracing::warn!(error = %close_err, "Failed to clean up containerd instance");
            }
            return Err(e);
        }
    }

    Ok((config, daemon))
}

/// Close the instance, then report the command's own error first.
pub(crate) async fn finish(
    mut daemon: DaemonInstance,
    result: Result<(), Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let closed = daemon.close().await;

    match (result, closed) {
        (Err(e), Err(close_err)) => {
            tracing::warn!(error = %close_err, "Failed to clean up containerd instance");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), Err(close_err)) => Err(close_err.into()),
        (Ok(()), Ok(())) => Ok(()),
    }
}

/// Token cancelled on Ctrl-C.
///
/// On unix the SIGINT handler is installed before returning, replacing the
/// default terminate action for the rest of the run.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::interrupt()) {
            Ok(mut sigint) => {
                tokio::spawn(async move {
                    if sigint.recv().await.is_some() {
                        tracing::info!("Interrupted, cancelling");
                        trigger.cancel();
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install SIGINT handler"),
        }
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });

    token
}
