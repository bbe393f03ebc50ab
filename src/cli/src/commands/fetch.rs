//! `a3s-ctd fetch` command.

use a3s_ctd_runtime::Fetcher;
use clap::Args;
use tokio_util::sync::CancellationToken;

use super::GlobalArgs;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Image references (e.g., "alpine", "docker.io/library/alpine:3.5")
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Verify image trust (not yet implemented; logs a warning)
    #[arg(long)]
    pub trust: bool,
}

pub async fn execute(
    global: &GlobalArgs,
    args: FetchArgs,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, daemon) = super::start_daemon(global, &cancel).await?;
    let fetcher = Fetcher::new(&config);

    let mut result: Result<(), Box<dyn std::error::Error>> = Ok(());
    for image in &args.images {
        eprintln!("Fetching {}...", image);
        if let Err(e) = fetcher
            .fetch_with_cancel(&daemon, image, args.trust, &cancel)
            .await
        {
            result = Err(e.into());
            break;
        }
    }

    super::finish(daemon, result).await
}
