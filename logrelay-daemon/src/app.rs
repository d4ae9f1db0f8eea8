//! Daemon assembly -- configuration, router construction, and the run loop.
//!
//! # Startup
//!
//! 1. Load `logrelay.toml`, apply environment and CLI overrides, validate
//! 2. Initialize tracing and (optionally) the metrics endpoint
//! 3. Connect the store and build the router (disabled if the store is down)
//! 4. Run the relay until SIGTERM/SIGINT or end of input

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use logrelay_core::config::LogRelayConfig;
use logrelay_core::pipeline::JobContextResolver;
use logrelay_core::types::JobContext;
use logrelay_router::context::ExecutionContextResolver;
use logrelay_router::{LogRouter, LogRouterBuilder, RedisStore, RouterConfig};

use crate::cli::DaemonCli;
use crate::context_file::StateFileProvider;
use crate::relay::{Relay, RelayOptions, RelaySummary};
use crate::{logging, metrics_server};

/// Load the configuration file and apply CLI overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the result is invalid.
pub async fn load_config(cli: &DaemonCli) -> Result<LogRelayConfig> {
    let mut config = LogRelayConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    apply_cli_overrides(&mut config, cli);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    Ok(config)
}

/// CLI flags take precedence over the file and environment.
pub fn apply_cli_overrides(config: &mut LogRelayConfig, cli: &DaemonCli) {
    if let Some(level) = &cli.log_level {
        config.general.log_level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format.clone_from(format);
    }
    if let Some(path) = &cli.context_file {
        config.intake.context_file = path.display().to_string();
    }
}

/// Check everything the daemon would reject at startup.
///
/// # Errors
///
/// Returns the first problem found.
pub fn check_config(config: &LogRelayConfig) -> Result<()> {
    RouterConfig::from_core(&config.routing)
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid routing config: {}", e))?;
    RelayOptions::from_config(&config.intake)?;
    if config.metrics.enabled {
        metrics_server::listen_addr(&config.metrics)?;
    }
    Ok(())
}

/// Job context resolver for the configured state file.
///
/// An empty path yields a resolver that never finds a job.
pub fn build_resolver(context_file: &str) -> Arc<dyn JobContextResolver> {
    if context_file.is_empty() {
        tracing::warn!("no context file configured, log lines will not be attributed to jobs");
        return Arc::new(|| -> Option<JobContext> { None });
    }
    Arc::new(ExecutionContextResolver::new(StateFileProvider::new(
        context_file,
    )))
}

/// Connect the store and build the router.
///
/// An unreachable store yields a disabled router rather than an error.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the store URL cannot be parsed.
pub fn build_router(config: &LogRelayConfig) -> Result<LogRouter> {
    let store = RedisStore::from_config(&config.redis)
        .map_err(|e| anyhow::anyhow!("failed to create store client: {}", e))?;

    let router = LogRouterBuilder::new()
        .config(RouterConfig::from_core(&config.routing))
        .store(Arc::new(store))
        .resolver(build_resolver(&config.intake.context_file))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build log router: {}", e))?;

    let summary = router.load_summary();
    tracing::info!(
        disabled = router.is_disabled(),
        patterns = router.catalog().map_or(0, |c| c.len()),
        failed_sources = summary.failed_sources.len(),
        "log router initialized"
    );
    Ok(router)
}

/// Run the daemon to completion.
pub async fn run(cli: DaemonCli) -> Result<()> {
    let config = load_config(&cli).await?;

    if cli.validate {
        check_config(&config)?;
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!("logrelay-daemon starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let options = RelayOptions::from_config(&config.intake)?;
    let router = tokio::task::spawn_blocking({
        let config = config.clone();
        move || build_router(&config)
    })
    .await??;
    let relay = Relay::new(Arc::new(router), options);

    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(cancel_on_signal(cancel.clone()));

    let summary = match &cli.input {
        Some(path) => run_file(relay, path, cancel.clone()).await?,
        None => relay.run(BufReader::new(tokio::io::stdin()), cancel.clone()).await?,
    };

    cancel.cancel();
    let _ = signal_task.await;

    tracing::info!(
        lines_read = summary.lines_read,
        errors_written = summary.errors_written,
        "logrelay-daemon shut down"
    );
    Ok(())
}

async fn run_file(relay: Relay, path: &Path, cancel: CancellationToken) -> Result<RelaySummary> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open input {}: {}", path.display(), e))?;
    relay.run(BufReader::new(file), cancel).await
}

/// Cancel `token` on SIGTERM or SIGINT, or return once it is cancelled elsewhere.
async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        result = wait_for_shutdown_signal() => match result {
            Ok(signal) => {
                tracing::info!(signal, "shutdown signal received");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to install signal handlers"),
        },
        _ = token.cancelled() => {}
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
