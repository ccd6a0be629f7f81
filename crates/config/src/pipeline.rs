//! Pipeline configuration
//!
//! One `[[pipelines]]` entry binds a source to a list of destinations and
//! carries the batching and retry tuning for that pipeline.

use std::time::Duration;

use serde::Deserialize;

use crate::drivers::{DestinationConfig, SourceConfig};

/// Default maximum records per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1;

/// Default batch wait time (no time-based flush)
pub const DEFAULT_MAX_WAIT_TIME_MS: i64 = 0;

/// Default first retry interval
pub const DEFAULT_INITIAL_INTERVAL_MS: u64 = 1500;

/// Default cap on the retry interval
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 10_000;

/// Default growth factor between retry intervals
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// What to do when a source closes its event stream while the pipeline runs
///
/// The source contract forbids this, so by default it is treated as a fatal
/// invariant violation.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamClosedPolicy {
    /// Log and terminate the process (default)
    #[default]
    Abort,
    /// Stop and restart the source, replaying from the last checkpoint
    Restart,
}

/// Exponential backoff settings shared by every retried operation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// First wait after a failure (milliseconds)
    /// Default: 1500
    pub initial_interval_ms: u64,

    /// Cap on the wait between attempts (milliseconds)
    /// Default: 10000
    pub max_interval_ms: u64,

    /// Growth factor applied after each failed attempt
    /// Default: 2.0
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: DEFAULT_INITIAL_INTERVAL_MS,
            max_interval_ms: DEFAULT_MAX_INTERVAL_MS,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl RetryConfig {
    #[inline]
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    #[inline]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Replace unset (zero) values with defaults
    pub fn normalize(&mut self) {
        if self.initial_interval_ms == 0 {
            self.initial_interval_ms = DEFAULT_INITIAL_INTERVAL_MS;
        }
        if self.max_interval_ms == 0 {
            self.max_interval_ms = DEFAULT_MAX_INTERVAL_MS;
        }
        if self.multiplier == 0.0 {
            self.multiplier = DEFAULT_MULTIPLIER;
        }
    }
}

/// Configuration of one replication pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, used in logs
    pub name: String,

    /// Maximum records per batch
    /// Default: 1
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Flush a non-empty batch after this long (milliseconds)
    /// Zero or negative disables time-based flushing.
    /// Default: 0
    #[serde(default)]
    pub max_wait_time_ms: i64,

    /// Retry tuning for hook chains, writes and checkpoints
    #[serde(default)]
    pub retry: RetryConfig,

    /// Behaviour when the source stream closes unexpectedly
    #[serde(default)]
    pub on_stream_closed: StreamClosedPolicy,

    /// Where events come from
    pub source: SourceConfig,

    /// Where events go, each with its own hook chain
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

impl PipelineConfig {
    /// Create a pipeline config with default tuning and no destinations
    pub fn new(name: impl Into<String>, source: SourceConfig) -> Self {
        Self {
            name: name.into(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_wait_time_ms: DEFAULT_MAX_WAIT_TIME_MS,
            retry: RetryConfig::default(),
            on_stream_closed: StreamClosedPolicy::default(),
            source,
            destinations: Vec::new(),
        }
    }

    /// Add a destination (builder style)
    pub fn with_destination(mut self, destination: DestinationConfig) -> Self {
        self.destinations.push(destination);
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_max_wait_time_ms(mut self, ms: i64) -> Self {
        self.max_wait_time_ms = ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_stream_closed_policy(mut self, policy: StreamClosedPolicy) -> Self {
        self.on_stream_closed = policy;
        self
    }

    /// Time-based flush interval, `None` when disabled
    pub fn max_wait_time(&self) -> Option<Duration> {
        u64::try_from(self.max_wait_time_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Check the pipeline on its own, without the rest of the config
    pub fn validate(&self) -> crate::Result<()> {
        crate::validation::validate_pipeline(self)
    }

    /// Replace unset (zero) values with defaults
    pub fn normalize(&mut self) {
        if self.max_batch_size == 0 {
            self.max_batch_size = DEFAULT_MAX_BATCH_SIZE;
        }
        self.retry.normalize();
    }
}
