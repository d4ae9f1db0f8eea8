//! Intake-to-router relay loop.
//!
//! A reader task decodes input lines into the shared [`LogBuffer`]; the
//! relay loop drains it in batches and hands each batch to the router on
//! the blocking pool, so a slow store never stalls intake.
//!
//! ```text
//! reader task -> LogBuffer -> (batch_size | flush tick) -> spawn_blocking(router.process_batch)
//! ```
//!
//! The loop ends on cancellation or end of input. Remaining lines are
//! drained before the router is shut down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use logrelay_core::config::IntakeConfig;
use logrelay_core::metrics as m;
use logrelay_core::types::LogLine;
use logrelay_router::LogRouter;

use crate::health::{ComponentHealth, DaemonHealth, aggregate_status, intake_status};
use crate::intake::{DropPolicy, LogBuffer, decode_line};

/// Interval between periodic health reports.
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Relay tuning derived from `[intake]`.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub buffer_capacity: usize,
    pub drop_policy: DropPolicy,
    pub health_interval: Duration,
}

impl RelayOptions {
    /// Build options from the intake configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the drop policy is unknown.
    pub fn from_config(config: &IntakeConfig) -> Result<Self> {
        Ok(Self {
            batch_size: config.batch_size.max(1),
            flush_interval: Duration::from_millis(config.flush_interval_ms.max(1)),
            buffer_capacity: config.buffer_capacity.max(1),
            drop_policy: config.drop_policy.parse()?,
            health_interval: HEALTH_INTERVAL,
        })
    }
}

/// Totals reported when the relay finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelaySummary {
    pub lines_read: u64,
    pub lines_dropped: u64,
    pub batches: u64,
    pub lines_routed: u64,
    pub errors_written: u64,
}

/// Relay between line intake and the log router.
pub struct Relay {
    router: Arc<LogRouter>,
    options: RelayOptions,
    buffer: Arc<Mutex<LogBuffer>>,
    flush_wanted: Arc<Notify>,
    started: Instant,
    summary: RelaySummary,
}

impl Relay {
    pub fn new(router: Arc<LogRouter>, options: RelayOptions) -> Self {
        let buffer = LogBuffer::new(options.buffer_capacity, options.drop_policy);
        Self {
            router,
            options,
            buffer: Arc::new(Mutex::new(buffer)),
            flush_wanted: Arc::new(Notify::new()),
            started: Instant::now(),
            summary: RelaySummary::default(),
        }
    }

    /// Current aggregated health.
    pub async fn health(&self) -> DaemonHealth {
        let utilization = self.buffer.lock().await.utilization();
        let components = vec![
            ComponentHealth::new("log-router", self.router.health()),
            ComponentHealth::new("intake", intake_status(utilization)),
        ];
        DaemonHealth {
            status: aggregate_status(&components),
            uptime_secs: self.started.elapsed().as_secs(),
            components,
        }
    }

    /// Run until `cancel` fires or the input ends.
    pub async fn run<R>(mut self, reader: R, cancel: CancellationToken) -> Result<RelaySummary>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let mut reader_task = tokio::spawn(read_lines(
            reader,
            Arc::clone(&self.buffer),
            Arc::clone(&self.flush_wanted),
            self.options.batch_size,
        ));
        let mut reader_done = false;
        let flush_wanted = Arc::clone(&self.flush_wanted);

        let mut flush_tick = tokio::time::interval(self.options.flush_interval);
        flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut health_tick = tokio::time::interval(self.options.health_interval);
        health_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            batch_size = self.options.batch_size,
            flush_interval_ms = self.options.flush_interval.as_millis() as u64,
            "relay started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("relay cancelled");
                    break;
                }
                result = &mut reader_task => {
                    reader_done = true;
                    match result {
                        Ok(Ok(lines)) => tracing::info!(lines, "input closed"),
                        Ok(Err(e)) => tracing::warn!(error = %e, "input read failed"),
                        Err(e) => tracing::warn!(error = %e, "reader task failed"),
                    }
                    break;
                }
                _ = flush_wanted.notified() => {
                    self.flush(false).await;
                }
                _ = flush_tick.tick() => {
                    self.flush(true).await;
                }
                _ = health_tick.tick() => {
                    self.report_health().await;
                }
            }
        }

        if !reader_done {
            reader_task.abort();
        }

        self.flush(true).await;
        let router = Arc::clone(&self.router);
        if let Err(e) = tokio::task::spawn_blocking(move || router.shutdown()).await {
            tracing::warn!(error = %e, "router shutdown task failed");
        }

        {
            let buffer = self.buffer.lock().await;
            self.summary.lines_read = buffer.total_received();
            self.summary.lines_dropped = buffer.dropped_count();
        }
        tracing::info!(
            lines_read = self.summary.lines_read,
            lines_dropped = self.summary.lines_dropped,
            batches = self.summary.batches,
            errors_written = self.summary.errors_written,
            "relay stopped"
        );
        Ok(self.summary)
    }

    /// Route buffered lines batch by batch.
    ///
    /// With `partial` unset only full batches are sent.
    async fn flush(&mut self, partial: bool) {
        loop {
            let batch = {
                let mut buffer = self.buffer.lock().await;
                if buffer.is_empty() || (!partial && !buffer.should_flush(self.options.batch_size))
                {
                    break;
                }
                let batch = buffer.drain_batch(self.options.batch_size);
                metrics::gauge!(m::INTAKE_BUFFER_SIZE).set(buffer.len() as f64);
                batch
            };
            self.route(batch).await;
        }
    }

    async fn route(&mut self, batch: Vec<LogLine>) {
        let router = Arc::clone(&self.router);
        match tokio::task::spawn_blocking(move || router.process_batch(&batch)).await {
            Ok(report) => {
                self.summary.batches += 1;
                self.summary.lines_routed += report.lines as u64;
                self.summary.errors_written += report.errors_written as u64;
            }
            Err(e) => tracing::warn!(error = %e, "routing task failed"),
        }
    }

    async fn report_health(&self) {
        let health = self.health().await;
        metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(health.uptime_secs as f64);
        if health.status.is_healthy() {
            tracing::debug!(uptime_secs = health.uptime_secs, "health check ok");
        } else {
            tracing::warn!(status = ?health.status, "daemon health degraded");
        }
    }
}

/// Read lines until end of input, pushing them into `buffer`.
///
/// Bytes are decoded lossily so a stray invalid sequence never ends intake.
async fn read_lines<R>(
    mut reader: R,
    buffer: Arc<Mutex<LogBuffer>>,
    flush_wanted: Arc<Notify>,
    batch_size: usize,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let mut count = 0u64;
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            return Ok(count);
        }
        count += 1;
        let line = decode_line(&String::from_utf8_lossy(&raw));
        metrics::counter!(m::INTAKE_LINES_READ_TOTAL).increment(1);

        let ready = {
            let mut buffer = buffer.lock().await;
            if buffer.push(line) {
                metrics::counter!(m::INTAKE_LINES_DROPPED_TOTAL).increment(1);
            }
            metrics::gauge!(m::INTAKE_BUFFER_SIZE).set(buffer.len() as f64);
            buffer.should_flush(batch_size)
        };
        if ready {
            flush_wanted.notify_one();
        }
    }
}
