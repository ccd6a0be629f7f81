//! Memory destination - records every batch
//!
//! The `MemoryDestination` keeps each written batch in memory and can be told
//! to fail writes or start-up. It is the recording test double for pipeline
//! tests; all instances created from one `MemoryDestinationHandle` share the
//! same record.
//!
//! # Example
//!
//! ```ignore
//! let handle = MemoryDestinationHandle::new();
//! registry.register_destination("memory", handle.factory())?;
//!
//! handle.fail_next_writes(2);
//! // ... run the pipeline ...
//! handle.wait_for_batches(1).await;
//! assert_eq!(handle.write_attempts(), 3);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_config::DestinationConfig;
use sluice_protocol::ChangeEvent;
use tokio::sync::Notify;
use tracing::debug;

use crate::{Destination, DestinationError, DestinationResult};

#[cfg(test)]
mod memory_test;

/// Driver name
pub const NAME: &str = "memory";

#[derive(Debug, Default)]
struct Shared {
    batches: Mutex<Vec<Vec<ChangeEvent>>>,
    configs: Mutex<Vec<DestinationConfig>>,
    write_attempts: AtomicUsize,
    fail_writes: AtomicUsize,
    fail_always: AtomicBool,
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    changed: Notify,
}

/// Inspects and steers `MemoryDestination` instances
#[derive(Debug, Clone, Default)]
pub struct MemoryDestinationHandle {
    shared: Arc<Shared>,
}

impl MemoryDestinationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a destination bound to this handle
    pub fn destination(&self) -> MemoryDestination {
        MemoryDestination {
            handle: self.clone(),
            started: false,
        }
    }

    /// Factory producing destinations bound to this handle
    pub fn factory(&self) -> impl Fn() -> Box<dyn Destination> + Send + Sync + 'static {
        let handle = self.clone();
        move || Box::new(handle.destination()) as Box<dyn Destination>
    }

    /// Successfully written batches, oldest first
    pub fn batches(&self) -> Vec<Vec<ChangeEvent>> {
        self.shared.batches.lock().clone()
    }

    /// Successfully written records, flattened in write order
    pub fn records(&self) -> Vec<ChangeEvent> {
        self.shared.batches.lock().iter().flatten().cloned().collect()
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.shared.batches.lock().len()
    }

    /// Number of `write_batch` calls, failed ones included
    pub fn write_attempts(&self) -> usize {
        self.shared.write_attempts.load(Ordering::SeqCst)
    }

    /// Configs passed to `init`
    pub fn configs(&self) -> Vec<DestinationConfig> {
        self.shared.configs.lock().clone()
    }

    /// Fail the next `n` writes
    pub fn fail_next_writes(&self, n: usize) {
        self.shared.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Fail every write until switched off
    pub fn fail_always(&self, fail: bool) {
        self.shared.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Fail `start`
    pub fn fail_start(&self, fail: bool) {
        self.shared.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Number of successful starts
    pub fn starts(&self) -> usize {
        self.shared.starts.load(Ordering::SeqCst)
    }

    /// Number of stops of a started destination
    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` batches were written
    pub async fn wait_for_batches(&self, n: usize) {
        self.wait_until(|| self.writes() >= n).await;
    }

    /// Wait until at least `n` writes were attempted
    pub async fn wait_for_attempts(&self, n: usize) {
        self.wait_until(|| self.write_attempts() >= n).await;
    }

    async fn wait_until(&self, done: impl Fn() -> bool) {
        loop {
            let notified = self.shared.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if done() {
                return;
            }
            notified.await;
        }
    }
}

/// Destination recording batches into a `MemoryDestinationHandle`
#[derive(Debug)]
pub struct MemoryDestination {
    handle: MemoryDestinationHandle,
    started: bool,
}

impl Default for MemoryDestination {
    fn default() -> Self {
        MemoryDestinationHandle::new().destination()
    }
}

impl MemoryDestination {
    pub fn handle(&self) -> &MemoryDestinationHandle {
        &self.handle
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, config: &DestinationConfig) -> DestinationResult<()> {
        self.handle.shared.configs.lock().push(config.clone());
        Ok(())
    }

    async fn start(&mut self) -> DestinationResult<()> {
        let shared = &self.handle.shared;
        if shared.fail_start.load(Ordering::SeqCst) {
            return Err(DestinationError::start(NAME, "injected failure"));
        }
        shared.starts.fetch_add(1, Ordering::SeqCst);
        self.started = true;
        debug!(destination = NAME, "memory destination started");
        Ok(())
    }

    async fn write_batch(&mut self, records: &[ChangeEvent]) -> DestinationResult<()> {
        if !self.started {
            return Err(DestinationError::NotStarted(NAME.into()));
        }
        let shared = &self.handle.shared;
        shared.write_attempts.fetch_add(1, Ordering::SeqCst);

        let failing = shared.fail_always.load(Ordering::SeqCst)
            || shared
                .fail_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();

        let result = if failing {
            Err(DestinationError::write(NAME, "injected failure"))
        } else {
            shared.batches.lock().push(records.to_vec());
            Ok(())
        };
        shared.changed.notify_waiters();
        result
    }

    async fn stop(&mut self) {
        if self.started {
            self.started = false;
            self.handle.shared.stops.fetch_add(1, Ordering::SeqCst);
            debug!(destination = NAME, "memory destination stopped");
        }
    }
}
