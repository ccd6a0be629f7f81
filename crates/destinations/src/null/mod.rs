//! Null destination - discards all records
//!
//! Counts what it receives and throws it away. Useful for measuring pipeline
//! overhead and for checking a config without a real target.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sluice_config::DestinationConfig;
use sluice_protocol::ChangeEvent;

use crate::{Destination, DestinationResult};


/// Driver name
pub const NAME: &str = "null";

/// Counters for the null destination
#[derive(Debug, Default)]
pub struct NullDestinationMetrics {
    batches_written: AtomicU64,
    records_written: AtomicU64,
}

impl NullDestinationMetrics {
    #[inline]
    pub fn record_batch(&self, records: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.records_written.fetch_add(records, Ordering::Relaxed);
    }

    #[inline]
    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }
}

/// Destination that discards every batch
#[derive(Debug, Default)]
pub struct NullDestination {
    metrics: Arc<NullDestinationMetrics>,
}

impl NullDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the counters
    pub fn metrics(&self) -> Arc<NullDestinationMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait]
impl Destination for NullDestination {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, _config: &DestinationConfig) -> DestinationResult<()> {
        Ok(())
    }

    async fn start(&mut self) -> DestinationResult<()> {
        Ok(())
    }

    async fn write_batch(&mut self, records: &[ChangeEvent]) -> DestinationResult<()> {
        self.metrics.record_batch(records.len() as u64);
        Ok(())
    }

    async fn stop(&mut self) {}
}
