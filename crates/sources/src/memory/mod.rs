//! Memory source - events pushed from a handle
//!
//! The `MemorySource` produces whatever is sent through its
//! `MemorySourceHandle` and records every checkpoint it is asked to persist.
//! It is the recording test double for pipeline tests.
//!
//! Events sent before `start` are buffered and delivered once the stream is
//! handed out. Each `start` after a `stop` opens a new stream.
//!
//! # Example
//!
//! ```ignore
//! let handle = MemorySourceHandle::new();
//! let factory = handle.factory();
//! registry.register_source("memory", factory)?;
//!
//! handle.send(event).await?;
//! assert_eq!(handle.checkpoints().len(), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_config::SourceConfig;
use sluice_protocol::ChangeEvent;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{EventStream, Source, SourceError, SourceResult};


/// Driver name
pub const NAME: &str = "memory";

/// Default stream capacity
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Shared {
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<ChangeEvent>>>,
    receiver: Mutex<Option<mpsc::Receiver<ChangeEvent>>>,
    checkpoints: Mutex<Vec<ChangeEvent>>,
    fail_checkpoints: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

/// Feeds and inspects a `MemorySource`
#[derive(Debug, Clone)]
pub struct MemorySourceHandle {
    shared: Arc<Shared>,
}

impl Default for MemorySourceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySourceHandle {
    /// Create a handle with the default stream capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            shared: Arc::new(Shared {
                capacity,
                sender: Mutex::new(Some(tx)),
                receiver: Mutex::new(Some(rx)),
                checkpoints: Mutex::new(Vec::new()),
                fail_checkpoints: AtomicUsize::new(0),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a source bound to this handle
    pub fn source(&self) -> MemorySource {
        MemorySource {
            handle: self.clone(),
            started: false,
        }
    }

    /// Factory producing sources bound to this handle
    pub fn factory(&self) -> impl Fn() -> Box<dyn Source> + Send + Sync + 'static {
        let handle = self.clone();
        move || Box::new(handle.source()) as Box<dyn Source>
    }

    /// Push an event into the current stream
    ///
    /// Waits while the stream is full.
    pub async fn send(&self, event: ChangeEvent) -> SourceResult<()> {
        let tx = self
            .shared
            .sender
            .lock()
            .clone()
            .ok_or_else(|| SourceError::Closed(NAME.into()))?;
        tx.send(event)
            .await
            .map_err(|_| SourceError::Closed(NAME.into()))
    }

    /// Push several events in order
    pub async fn send_all<I>(&self, events: I) -> SourceResult<()>
    where
        I: IntoIterator<Item = ChangeEvent>,
    {
        for event in events {
            self.send(event).await?;
        }
        Ok(())
    }

    /// Close the current stream, as a misbehaving source would
    pub fn close(&self) {
        self.shared.sender.lock().take();
    }

    /// Every event checkpointed so far, oldest first
    pub fn checkpoints(&self) -> Vec<ChangeEvent> {
        self.shared.checkpoints.lock().clone()
    }

    /// Most recent checkpointed event
    pub fn last_checkpoint(&self) -> Option<ChangeEvent> {
        self.shared.checkpoints.lock().last().cloned()
    }

    /// Fail the next `n` checkpoint calls
    pub fn fail_next_checkpoints(&self, n: usize) {
        self.shared.fail_checkpoints.store(n, Ordering::SeqCst);
    }

    /// Number of times the source was started
    pub fn starts(&self) -> usize {
        self.shared.starts.load(Ordering::SeqCst)
    }

    /// Number of times the source was stopped
    pub fn stops(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }
}

/// Source producing events pushed through a `MemorySourceHandle`
#[derive(Debug)]
pub struct MemorySource {
    handle: MemorySourceHandle,
    started: bool,
}

impl Default for MemorySource {
    fn default() -> Self {
        MemorySourceHandle::new().source()
    }
}

impl MemorySource {
    pub fn handle(&self) -> &MemorySourceHandle {
        &self.handle
    }
}

#[async_trait]
impl Source for MemorySource {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, _config: &SourceConfig) -> SourceResult<()> {
        Ok(())
    }

    async fn start(&mut self) -> SourceResult<EventStream> {
        if self.started {
            return Err(SourceError::AlreadyStarted(NAME.into()));
        }
        let shared = &self.handle.shared;

        let stream = match shared.receiver.lock().take() {
            Some(rx) => rx,
            None => {
                let (tx, rx) = mpsc::channel(shared.capacity);
                *shared.sender.lock() = Some(tx);
                rx
            }
        };

        shared.starts.fetch_add(1, Ordering::SeqCst);
        self.started = true;
        debug!(source = NAME, "memory source started");
        Ok(stream)
    }

    async fn checkpoint(&mut self, event: &ChangeEvent) -> SourceResult<()> {
        let shared = &self.handle.shared;
        let failing = shared
            .fail_checkpoints
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SourceError::checkpoint(NAME, "injected failure"));
        }
        shared.checkpoints.lock().push(event.clone());
        Ok(())
    }

    async fn stop(&mut self) {
        if self.started {
            self.started = false;
            self.handle.shared.stops.fetch_add(1, Ordering::SeqCst);
            debug!(source = NAME, "memory source stopped");
        }
    }
}
