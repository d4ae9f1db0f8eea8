//! Log intake -- line decoding and bounded buffering.
//!
//! Each input line becomes one [`LogLine`]. JSON objects carrying a
//! timestamp and message (`{"t", "m"}` or `{"timestamp", "message"}`)
//! keep their timestamp; anything else is taken as plain text stamped
//! with the current time.
//!
//! # Overflow policy
//!
//! When the [`LogBuffer`] is full:
//! - [`DropPolicy::Oldest`]: drop the oldest buffered line
//! - [`DropPolicy::Newest`]: reject the incoming line

use std::collections::VecDeque;
use std::str::FromStr;

use serde::Deserialize;

use logrelay_core::types::{LogLine, unix_timestamp};

/// Buffer overflow policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropPolicy {
    /// Drop the oldest entry (default).
    #[default]
    Oldest,
    /// Reject the new entry.
    Newest,
}

impl FromStr for DropPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oldest" => Ok(Self::Oldest),
            "newest" => Ok(Self::Newest),
            other => Err(anyhow::anyhow!(
                "unknown drop policy '{other}', expected 'oldest' or 'newest'"
            )),
        }
    }
}

/// JSON form of an input line. Unlike [`LogLine`], the message is required.
#[derive(Deserialize)]
struct WireLine {
    #[serde(alias = "t")]
    timestamp: Option<f64>,
    #[serde(alias = "m")]
    message: String,
}

/// Decode one input line.
///
/// The trailing newline (and `\r`) is stripped. Lines that look like a JSON
/// object but do not decode as a log line are passed through verbatim.
pub fn decode_line(raw: &str) -> LogLine {
    let raw = raw.trim_end_matches(['\n', '\r']);
    if raw.trim_start().starts_with('{')
        && let Ok(wire) = serde_json::from_str::<WireLine>(raw)
    {
        return LogLine::at(wire.timestamp.unwrap_or_else(unix_timestamp), wire.message);
    }
    LogLine::new(raw)
}

/// Bounded in-memory line buffer.
pub struct LogBuffer {
    buffer: VecDeque<LogLine>,
    capacity: usize,
    drop_policy: DropPolicy,
    dropped_count: u64,
    total_received: u64,
}

impl LogBuffer {
    /// Create a buffer holding at most `capacity` lines.
    pub fn new(capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            drop_policy,
            dropped_count: 0,
            total_received: 0,
        }
    }

    /// Append a line, applying the drop policy when full.
    ///
    /// Returns `true` when a line was dropped.
    pub fn push(&mut self, line: LogLine) -> bool {
        self.total_received += 1;

        if self.buffer.len() >= self.capacity {
            self.dropped_count += 1;
            match self.drop_policy {
                DropPolicy::Oldest => {
                    self.buffer.pop_front();
                    self.buffer.push_back(line);
                    tracing::warn!(
                        dropped = self.dropped_count,
                        capacity = self.capacity,
                        "intake buffer full, dropped oldest line"
                    );
                }
                DropPolicy::Newest => {
                    tracing::warn!(
                        dropped = self.dropped_count,
                        capacity = self.capacity,
                        "intake buffer full, rejected new line"
                    );
                }
            }
            return true;
        }

        self.buffer.push_back(line);
        false
    }

    /// Drain up to `batch_size` lines from the front.
    pub fn drain_batch(&mut self, batch_size: usize) -> Vec<LogLine> {
        let count = batch_size.min(self.buffer.len());
        self.buffer.drain(..count).collect()
    }

    /// Drain every buffered line.
    pub fn drain_all(&mut self) -> Vec<LogLine> {
        self.buffer.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines dropped so far.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Lines received so far, dropped ones included.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    /// Fill ratio in `0.0..=1.0`.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(u32::try_from(self.buffer.len()).unwrap_or(u32::MAX))
            / f64::from(u32::try_from(self.capacity).unwrap_or(u32::MAX))
    }

    /// Whether at least `batch_size` lines are waiting.
    pub fn should_flush(&self, batch_size: usize) -> bool {
        self.buffer.len() >= batch_size
    }
}
