//! `blokgate` binary.

use blokgate_cli::{BlokgateApp, CliArgs};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let app = BlokgateApp::from_args(&args)?;
    app.run(args).await?;
    Ok(())
}
