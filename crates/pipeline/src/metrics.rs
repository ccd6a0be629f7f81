//! Pipeline metrics
//!
//! Atomic counters for one pipeline. All operations use relaxed ordering;
//! values are eventually consistent, not real-time.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one pipeline
///
/// Shared between the main loop, the delivery tasks and whoever reports
/// metrics. All methods are safe to call concurrently.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Events taken from the source stream
    events_received: AtomicU64,

    /// Windows closed by size or time
    batches_collected: AtomicU64,

    /// Windows delivered to every destination
    batches_delivered: AtomicU64,

    /// Records accepted by destination writes
    records_written: AtomicU64,

    /// Records dropped by hook chains
    records_dropped: AtomicU64,

    /// Failed hook chain passes
    transform_failures: AtomicU64,

    /// Failed destination writes
    write_failures: AtomicU64,

    /// Successful source checkpoints
    checkpoints: AtomicU64,

    /// Failed source checkpoints
    checkpoint_failures: AtomicU64,

    /// Source restarts after an unexpected stream close
    source_restarts: AtomicU64,
}

impl PipelineMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            batches_collected: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            transform_failures: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            checkpoints: AtomicU64::new(0),
            checkpoint_failures: AtomicU64::new(0),
            source_restarts: AtomicU64::new(0),
        }
    }

    /// Record a closed window of `events` source events
    #[inline]
    pub fn record_collected(&self, events: u64) {
        self.events_received.fetch_add(events, Ordering::Relaxed);
        self.batches_collected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delivered(&self) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self, records: u64) {
        self.records_written.fetch_add(records, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self, records: u64) {
        self.records_dropped.fetch_add(records, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transform_failure(&self) {
        self.transform_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_checkpoint_failure(&self) {
        self.checkpoint_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_source_restart(&self) {
        self.source_restarts.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            batches_collected: self.batches_collected.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            transform_failures: self.transform_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            checkpoints: self.checkpoints.load(Ordering::Relaxed),
            checkpoint_failures: self.checkpoint_failures.load(Ordering::Relaxed),
            source_restarts: self.source_restarts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub batches_collected: u64,
    pub batches_delivered: u64,
    pub records_written: u64,
    pub records_dropped: u64,
    pub transform_failures: u64,
    pub write_failures: u64,
    pub checkpoints: u64,
    pub checkpoint_failures: u64,
    pub source_restarts: u64,
}

impl MetricsSnapshot {
    /// Share of collected windows that were delivered (0.0 - 1.0)
    ///
    /// Returns None if no window was collected yet.
    #[inline]
    pub fn delivery_rate(&self) -> Option<f64> {
        if self.batches_collected == 0 {
            None
        } else {
            Some(self.batches_delivered as f64 / self.batches_collected as f64)
        }
    }

    /// Difference from an earlier snapshot
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.saturating_sub(previous.events_received),
            batches_collected: self
                .batches_collected
                .saturating_sub(previous.batches_collected),
            batches_delivered: self
                .batches_delivered
                .saturating_sub(previous.batches_delivered),
            records_written: self.records_written.saturating_sub(previous.records_written),
            records_dropped: self.records_dropped.saturating_sub(previous.records_dropped),
            transform_failures: self
                .transform_failures
                .saturating_sub(previous.transform_failures),
            write_failures: self.write_failures.saturating_sub(previous.write_failures),
            checkpoints: self.checkpoints.saturating_sub(previous.checkpoints),
            checkpoint_failures: self
                .checkpoint_failures
                .saturating_sub(previous.checkpoint_failures),
            source_restarts: self.source_restarts.saturating_sub(previous.source_restarts),
        }
    }
}
