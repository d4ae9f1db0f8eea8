use anyhow::Result;
use clap::Parser;

use logrelay_daemon::cli::DaemonCli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    logrelay_daemon::app::run(cli).await
}
