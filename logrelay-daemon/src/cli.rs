//! CLI argument definitions for logrelay-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// logrelay log routing daemon.
///
/// Reads log lines from stdin or a file, batches them, and hands each
/// batch to the log router for live broadcast and error detection.
#[derive(Parser, Debug)]
#[command(name = "logrelay-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logrelay.toml configuration file.
    #[arg(short, long, default_value = "/etc/logrelay/logrelay.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Read log lines from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the job state file used to resolve the current job.
    #[arg(long)]
    pub context_file: Option<PathBuf>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
