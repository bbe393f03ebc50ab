//! A3S ctd CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use a3s_ctd_cli::commands::{dispatch, Cli, LogFormat};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr; stdout may carry archive data.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match cli.global.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
