//! `a3s-ctd normalize` command.

use clap::Args;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Image names to normalize
    #[arg(required = true)]
    pub images: Vec<String>,
}

pub async fn execute(args: NormalizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    for image in &args.images {
        println!("{}", a3s_ctd_runtime::normalize(image));
    }
    Ok(())
}
