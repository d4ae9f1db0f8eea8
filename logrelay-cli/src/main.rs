use clap::Parser;
use tracing_subscriber::EnvFilter;

use logrelay_cli::cli::{Cli, Commands};
use logrelay_cli::commands;
use logrelay_cli::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries command output, diagnostics go to stderr
    let filter = cli.log_level.as_deref().unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Patterns(args) => commands::patterns::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
