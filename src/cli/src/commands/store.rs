//! `a3s-ctd store` command — fetch images and archive the content store.
//!
//! The archive extracts to `var/lib/containerd/`, ready to drop into a root
//! filesystem whose containerd should start with the images present.

use std::io::{BufWriter, Write};
use std::path::Path;

use a3s_ctd_core::error::Result as CtdResult;
use a3s_ctd_runtime::{store_dir, Fetcher};
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Image references to fetch before archiving
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Output tar file ("-" for stdout)
    #[arg(short, long)]
    pub output: String,

    /// Verify image trust (not yet implemented; logs a warning)
    #[arg(long)]
    pub trust: bool,
}

pub async fn execute(
    global: &GlobalArgs,
    args: StoreArgs,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, daemon) = super::start_daemon(global, &cancel).await?;
    let fetcher = Fetcher::new(&config);

    let result = async {
        for image in &args.images {
            eprintln!("Fetching {}...", image);
            fetcher
                .fetch_with_cancel(&daemon, image, args.trust, &cancel)
                .await?;
        }

        let root = daemon.root_dir();
        let output = args.output.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || write_archive(&root, &output, &cancel)).await??;

        if args.output != "-" {
            let size = std::fs::metadata(&args.output).map(|m| m.len()).unwrap_or(0);
            eprintln!(
                "Saved content store to {} ({})",
                args.output,
                crate::output::format_bytes(size)
            );
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    }
    .await;

    super::finish(daemon, result).await
}

/// Archive `root` to `output` ("-" for stdout). A failed write removes the
/// partial file.
pub(crate) fn write_archive(root: &Path, output: &str, cancel: &CancellationToken) -> CtdResult<()> {
    if output == "-" {
        let stdout = std::io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        store_dir(root, &mut writer, cancel)?;
        writer.flush()?;
        return Ok(());
    }

    let result = (|| -> CtdResult<()> {
        let mut writer = BufWriter::new(std::fs::File::create(output)?);
        store_dir(root, &mut writer, cancel)?;
        writer.flush()?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(output);
    }
    result
}
