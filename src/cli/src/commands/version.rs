//! `a3s-ctd version` command.

use clap::Args;

#[derive(Args)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("a3s-ctd version {}", a3s_ctd_core::VERSION);
    Ok(())
}
