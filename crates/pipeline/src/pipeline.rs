//! Pipeline - lifecycle and main loop
//!
//! ```text
//! Stopped ──run()──→ Starting ──→ Running ──stop()──→ Stopping ──→ Stopped
//!                       │
//!                       └── start failure: started drivers stopped, back to Stopped
//! ```
//!
//! `run` moves the source and destinations into the main-loop task; `stop`
//! cancels the task and gets them back when it is joined. Both hold the same
//! async lock for their whole body, so concurrent run/stop calls serialize.
//!
//! One main-loop iteration is one batch cycle:
//!
//! 1. collect a window (per-destination copies of each event)
//! 2. deliver it to every destination concurrently
//! 3. on full success, checkpoint the window's last event at the source
//!
//! Steps 2 and 3 retry until they succeed or the pipeline is stopped, so a
//! checkpoint never advances past a batch some destination did not accept.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use sluice_config::StreamClosedPolicy;
use sluice_protocol::ChangeEvent;
use sluice_sources::{EventStream, Source};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::fanout::resume_panic;
use crate::{
    BatchWindow, DestinationSlot, FanOutWriter, MetricsSnapshot, PipelineError, PipelineMetrics,
    Result, RetryPolicy, WindowOutcome,
};

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning shared by every batch cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub window: BatchWindow,
    pub retry: RetryPolicy,
    pub on_stream_closed: StreamClosedPolicy,
}

/// Drivers owned by the pipeline while it is not running
struct Drivers {
    source: Box<dyn Source>,
    /// Cleared while a restart is pending, so `stop` is only called on a
    /// started source
    source_started: bool,
    destinations: Vec<DestinationSlot>,
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<Drivers>,
}

#[derive(Default)]
struct Lifecycle {
    drivers: Option<Drivers>,
    running: Option<Running>,
}

/// One source replicated to a list of destinations
pub struct Pipeline {
    name: Arc<str>,
    settings: PipelineSettings,
    metrics: Arc<PipelineMetrics>,
    state: Mutex<PipelineState>,
    lifecycle: AsyncMutex<Lifecycle>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline from bound drivers
    ///
    /// Usually reached through `PipelineBuilder`.
    pub(crate) fn new(
        name: impl Into<Arc<str>>,
        source: Box<dyn Source>,
        destinations: Vec<DestinationSlot>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
            state: Mutex::new(PipelineState::Stopped),
            lifecycle: AsyncMutex::new(Lifecycle {
                drivers: Some(Drivers {
                    source,
                    source_started: false,
                    destinations,
                }),
                running: None,
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    #[inline]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Shared handle to the counters, valid for the pipeline's lifetime
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock() = state;
    }

    /// Start the source, then every destination in order, then the main loop
    ///
    /// Does nothing if already running. If any start fails, whatever was
    /// started is stopped again and the pipeline stays `Stopped`.
    pub async fn run(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.running.is_some() {
            warn!(pipeline = %self.name, "pipeline is already running");
            return Ok(());
        }
        let Some(mut drivers) = lifecycle.drivers.take() else {
            return Err(PipelineError::Defunct(self.name.to_string()));
        };

        self.set_state(PipelineState::Starting);
        info!(
            pipeline = %self.name,
            source = drivers.source.name(),
            destinations = drivers.destinations.len(),
            "starting pipeline"
        );

        let stream = match self.start_drivers(&mut drivers).await {
            Ok(stream) => stream,
            Err(e) => {
                lifecycle.drivers = Some(drivers);
                self.set_state(PipelineState::Stopped);
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let main_loop = MainLoop {
            name: Arc::clone(&self.name),
            settings: self.settings,
            metrics: Arc::clone(&self.metrics),
            writer: FanOutWriter::new(
                Arc::clone(&self.name),
                self.settings.retry,
                Arc::clone(&self.metrics),
            ),
            cancel: cancel.clone(),
            drivers,
            stream,
        };
        let task = tokio::spawn(main_loop.run());

        lifecycle.running = Some(Running { cancel, task });
        self.set_state(PipelineState::Running);
        info!(pipeline = %self.name, "pipeline running");
        Ok(())
    }

    async fn start_drivers(&self, drivers: &mut Drivers) -> Result<EventStream> {
        let stream = drivers.source.start().await.inspect_err(|e| {
            error!(pipeline = %self.name, error = %e, "source failed to start");
        })?;
        drivers.source_started = true;

        for i in 0..drivers.destinations.len() {
            let started = drivers.destinations[i].destination_mut().start().await;
            if let Err(e) = started {
                let slot = &drivers.destinations[i];
                error!(
                    pipeline = %self.name,
                    destination = i,
                    driver = slot.driver(),
                    error = %e,
                    "destination failed to start"
                );
                let driver = slot.driver().to_string();

                drivers.source.stop().await;
                drivers.source_started = false;
                for slot in drivers.destinations[..i].iter_mut() {
                    slot.destination_mut().stop().await;
                }
                return Err(PipelineError::destination(i, driver, e));
            }
        }
        Ok(stream)
    }

    /// Cancel the main loop, wait for it, then stop the source and every
    /// destination in order
    ///
    /// Does nothing if not running. A panic in the main loop or a delivery
    /// task is re-raised here, after the state returned to `Stopped`.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.running.take() else {
            warn!(pipeline = %self.name, "pipeline is not running");
            return;
        };

        self.set_state(PipelineState::Stopping);
        info!(pipeline = %self.name, "stopping pipeline");
        running.cancel.cancel();

        let mut drivers = match running.task.await {
            Ok(drivers) => drivers,
            Err(err) => {
                self.set_state(PipelineState::Stopped);
                error!(pipeline = %self.name, "pipeline main loop panicked");
                resume_panic(err);
            }
        };

        if drivers.source_started {
            drivers.source.stop().await;
            drivers.source_started = false;
        } else {
            debug!(pipeline = %self.name, "source is not started, skipping its stop");
        }
        for slot in drivers.destinations.iter_mut() {
            slot.destination_mut().stop().await;
        }
        lifecycle.drivers = Some(drivers);

        self.set_state(PipelineState::Stopped);
        let snapshot = self.metrics.snapshot();
        info!(
            pipeline = %self.name,
            batches_delivered = snapshot.batches_delivered,
            records_written = snapshot.records_written,
            checkpoints = snapshot.checkpoints,
            "pipeline stopped"
        );
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(running) = &self.lifecycle.get_mut().running {
            running.cancel.cancel();
        }
    }
}

/// State owned by the main-loop task
struct MainLoop {
    name: Arc<str>,
    settings: PipelineSettings,
    metrics: Arc<PipelineMetrics>,
    writer: FanOutWriter,
    cancel: CancellationToken,
    drivers: Drivers,
    stream: EventStream,
}

impl MainLoop {
    async fn run(mut self) -> Drivers {
        debug!(pipeline = %self.name, "main loop started");

        while self.cycle().await {}

        debug!(pipeline = %self.name, "main loop exited");
        self.drivers
    }

    /// One batch cycle; false once the loop should exit
    async fn cycle(&mut self) -> bool {
        let window = match self
            .settings
            .window
            .collect(&mut self.stream, &self.cancel)
            .await
        {
            WindowOutcome::Ready(window) => window,
            WindowOutcome::Cancelled => return false,
            WindowOutcome::StreamClosed { discarded } => {
                return self.stream_closed(discarded).await;
            }
        };

        self.metrics.record_collected(window.len() as u64);
        debug!(pipeline = %self.name, events = window.len(), "window closed");

        let (batches, last_event) = window.into_parts();
        let slots = std::mem::take(&mut self.drivers.destinations);
        let (slots, delivered) = self.writer.deliver(slots, batches, &self.cancel).await;
        self.drivers.destinations = slots;

        if let Err(cancelled) = delivered {
            debug!(pipeline = %self.name, reason = %cancelled, "delivery cancelled");
            return false;
        }
        self.metrics.record_delivered();

        self.checkpoint(&last_event).await
    }

    async fn checkpoint(&mut self, event: &ChangeEvent) -> bool {
        let mut retry = self.settings.retry.start("checkpoint", &self.cancel);
        loop {
            if let Err(cancelled) = retry.begin() {
                debug!(pipeline = %self.name, reason = %cancelled, "checkpoint cancelled");
                return false;
            }
            match self.drivers.source.checkpoint(event).await {
                Ok(()) => {
                    retry.succeeded();
                    self.metrics.record_checkpoint();
                    return true;
                }
                Err(e) => {
                    self.metrics.record_checkpoint_failure();
                    retry.failed(e).await;
                }
            }
        }
    }

    async fn stream_closed(&mut self, discarded: usize) -> bool {
        match self.settings.on_stream_closed {
            StreamClosedPolicy::Abort => {
                error!(
                    pipeline = %self.name,
                    source = self.drivers.source.name(),
                    discarded,
                    "source closed its event stream while running, aborting"
                );
                std::process::abort();
            }
            StreamClosedPolicy::Restart => {
                warn!(
                    pipeline = %self.name,
                    source = self.drivers.source.name(),
                    discarded,
                    "source closed its event stream while running, restarting it"
                );
                self.restart_source().await
            }
        }
    }

    async fn restart_source(&mut self) -> bool {
        self.drivers.source.stop().await;
        self.drivers.source_started = false;

        let mut retry = self.settings.retry.start("source restart", &self.cancel);
        loop {
            if retry.begin().is_err() {
                return false;
            }
            match self.drivers.source.start().await {
                Ok(stream) => {
                    retry.succeeded();
                    self.drivers.source_started = true;
                    self.stream = stream;
                    self.metrics.record_source_restart();
                    info!(pipeline = %self.name, "source restarted");
                    return true;
                }
                Err(e) => retry.failed(e).await,
            }
        }
    }
}
