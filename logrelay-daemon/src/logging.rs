//! Logging initialization for logrelay-daemon.
//!
//! Output goes to stderr so daemon diagnostics never mix with the relayed
//! log stream on stdout. `RUST_LOG` takes precedence over `general.log_level`.

use anyhow::{Result, bail};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use logrelay_core::config::GeneralConfig;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Initialize the global tracing subscriber from `[general]`.
///
/// Call once, before any tracing macros are used.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let layer = stderr_layer(&config.log_format)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

/// `json` for machine-parseable lines, `pretty` for development.
fn stderr_layer<S>(format: &str) -> Result<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let layer = match format {
        "json" => base.json().with_current_span(false).boxed(),
        "pretty" => base.pretty().boxed(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };
    Ok(layer)
}
