//! Stdout destination - JSON lines
//!
//! Writes each record as one JSON object per line. Meant for debugging a
//! pipeline, not for throughput.
//!
//! # Options
//!
//! | Option | Default | Meaning |
//! |--------|---------|---------|
//! | `pretty` | `false` | Pretty-print each record (multi-line) |
//! | `max_records` | `0` | Records printed per batch, `0` for all |
//!
//! # Example Output
//!
//! ```text
//! {"kind":"insert","fields":{"id":1,"name":"ada"},"table":{"name":"users",...},...}
//! ```

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_config::DestinationConfig;
use sluice_protocol::ChangeEvent;

use crate::{Destination, DestinationError, DestinationResult};


/// Driver name
pub const NAME: &str = "stdout";

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StdoutConfig {
    /// Pretty-print records
    pub pretty: bool,

    /// Maximum records to print per batch (0 = all)
    pub max_records: usize,
}

impl TryFrom<&DestinationConfig> for StdoutConfig {
    type Error = DestinationError;

    fn try_from(config: &DestinationConfig) -> Result<Self, Self::Error> {
        let options = &config.options;
        let mut out = Self::default();

        if options.contains("pretty") {
            out.pretty = options.get_bool("pretty").ok_or_else(|| {
                DestinationError::invalid_option(NAME, "pretty", "expected a boolean")
            })?;
        }

        if options.contains("max_records") {
            let max = options.get_int("max_records").ok_or_else(|| {
                DestinationError::invalid_option(NAME, "max_records", "expected an integer")
            })?;
            out.max_records = usize::try_from(max).map_err(|_| {
                DestinationError::invalid_option(NAME, "max_records", "must not be negative")
            })?;
        }

        Ok(out)
    }
}

/// Counters for the stdout destination
#[derive(Debug, Default)]
pub struct StdoutDestinationMetrics {
    batches_written: AtomicU64,
    records_written: AtomicU64,
    bytes_written: AtomicU64,
}

impl StdoutDestinationMetrics {
    #[inline]
    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }
}

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Destination printing records as JSON lines
pub struct StdoutDestination {
    config: StdoutConfig,
    writer: SharedWriter,
    metrics: Arc<StdoutDestinationMetrics>,
}

impl fmt::Debug for StdoutDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdoutDestination")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Default for StdoutDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutDestination {
    /// Create a destination writing to the process stdout
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Create a destination writing to any sink (files, buffers in tests)
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            config: StdoutConfig::default(),
            writer: Arc::new(Mutex::new(Box::new(writer))),
            metrics: Arc::new(StdoutDestinationMetrics::default()),
        }
    }

    pub fn config(&self) -> &StdoutConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<StdoutDestinationMetrics> {
        Arc::clone(&self.metrics)
    }

    fn render(&self, records: &[ChangeEvent]) -> DestinationResult<Vec<u8>> {
        let limit = match self.config.max_records {
            0 => records.len(),
            n => n.min(records.len()),
        };

        let mut buf = Vec::with_capacity(limit * 128);
        for record in &records[..limit] {
            if self.config.pretty {
                serde_json::to_writer_pretty(&mut buf, record)?;
            } else {
                serde_json::to_writer(&mut buf, record)?;
            }
            buf.push(b'\n');
        }
        if limit < records.len() {
            writeln!(buf, "... {} more", records.len() - limit)?;
        }
        Ok(buf)
    }
}

#[async_trait]
impl Destination for StdoutDestination {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, config: &DestinationConfig) -> DestinationResult<()> {
        self.config = StdoutConfig::try_from(config)?;
        Ok(())
    }

    async fn start(&mut self) -> DestinationResult<()> {
        Ok(())
    }

    async fn write_batch(&mut self, records: &[ChangeEvent]) -> DestinationResult<()> {
        let buf = self.render(records)?;
        {
            let mut writer = self.writer.lock();
            writer.write_all(&buf)?;
            writer.flush()?;
        }

        self.metrics.batches_written.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .records_written
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        self.metrics
            .bytes_written
            .fetch_add(buf.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    async fn stop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}
