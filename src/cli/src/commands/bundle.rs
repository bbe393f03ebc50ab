//! `a3s-ctd bundle` command — image name + config.json as tar, plus a fetch.

use std::io::Write;
use std::path::PathBuf;

use a3s_ctd_core::error::{CtdError, Result as CtdResult};
use a3s_ctd_runtime::{bundle_with_cancel, Fetcher};
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Directory inside the archive (e.g., "containers/getty")
    pub path: String,

    /// Image reference stored in the bundle and fetched
    pub image: String,

    /// Runtime config file, stored as config.json (must be JSON)
    #[arg(long = "spec", value_name = "FILE")]
    pub spec: PathBuf,

    /// Output tar file ("-" for stdout)
    #[arg(short, long)]
    pub output: String,

    /// Verify image trust (not yet implemented; logs a warning)
    #[arg(long)]
    pub trust: bool,
}

pub async fn execute(
    global: &GlobalArgs,
    args: BundleArgs,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_bytes = read_config(&args.spec)?;

    let (config, daemon) = super::start_daemon(global, &cancel).await?;
    let fetcher = Fetcher::new(&config);

    let result = async {
        let blob = bundle_with_cancel(
            &fetcher,
            &daemon,
            &args.path,
            &args.image,
            &config_bytes,
            args.trust,
            &cancel,
        )
        .await?;

        if args.output == "-" {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&blob)?;
            stdout.flush()?;
        } else {
            std::fs::write(&args.output, &blob)
                .map_err(|e| format!("Failed to write {}: {}", args.output, e))?;
            eprintln!(
                "Saved bundle {} to {} ({})",
                args.path,
                args.output,
                crate::output::format_bytes(blob.len() as u64)
            );
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    }
    .await;

    super::finish(daemon, result).await
}

/// Read the runtime config, rejecting anything that is not JSON.
///
/// The bytes are stored verbatim, not re-serialized.
fn read_config(path: &std::path::Path) -> CtdResult<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| {
        CtdError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_slice::<serde_json::Value>(&bytes)?;
    Ok(bytes)
}
