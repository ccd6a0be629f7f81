//! Batch window - size or time bounded accumulation
//!
//! One window collects one batch per destination. Every incoming event is
//! cloned once per destination so hook chains can mutate their copy freely.
//! The window closes when
//!
//! - the batch reaches `max_batch_size` (immediately, timer or not), or
//! - the wait timer fires while at least one event is buffered.
//!
//! Without a wait time the window closes on size alone, however slowly
//! events arrive.

use std::time::Duration;

use sluice_protocol::ChangeEvent;
use sluice_sources::EventStream;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;

/// A closed window: one batch per destination plus the checkpoint event
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBatch {
    batches: Vec<Vec<ChangeEvent>>,
    last_event: ChangeEvent,
    len: usize,
}

impl WindowBatch {
    /// Number of source events in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most recent source event, the one to checkpoint
    #[inline]
    pub fn last_event(&self) -> &ChangeEvent {
        &self.last_event
    }

    /// Per-destination copies, in destination order
    #[inline]
    pub fn batches(&self) -> &[Vec<ChangeEvent>] {
        &self.batches
    }

    pub fn into_parts(self) -> (Vec<Vec<ChangeEvent>>, ChangeEvent) {
        (self.batches, self.last_event)
    }
}

/// How a window ended
#[derive(Debug)]
pub enum WindowOutcome {
    /// Size or time threshold reached
    Ready(WindowBatch),
    /// Cancellation requested; buffered events are discarded
    Cancelled,
    /// The source closed its stream; buffered events are discarded
    StreamClosed { discarded: usize },
}

/// Accumulates events into per-destination batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    max_batch_size: usize,
    max_wait: Option<Duration>,
    destinations: usize,
}

impl BatchWindow {
    /// Create a window; a zero batch size is raised to 1 and a zero wait
    /// disables the timer
    pub fn new(max_batch_size: usize, max_wait: Option<Duration>, destinations: usize) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            max_wait: max_wait.filter(|w| !w.is_zero()),
            destinations,
        }
    }

    #[inline]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    #[inline]
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    #[inline]
    pub fn destinations(&self) -> usize {
        self.destinations
    }

    /// Collect one window from `stream`
    pub async fn collect(
        &self,
        stream: &mut EventStream,
        cancel: &CancellationToken,
    ) -> WindowOutcome {
        let mut batches: Vec<Vec<ChangeEvent>> = (0..self.destinations)
            .map(|_| Vec::with_capacity(self.max_batch_size))
            .collect();
        let mut last_event: Option<ChangeEvent> = None;
        let mut len = 0usize;

        let mut timer = self.max_wait.map(|wait| {
            let mut interval = time::interval_at(Instant::now() + wait, wait);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return WindowOutcome::Cancelled,

                _ = tick(&mut timer) => {
                    if let Some(last_event) = last_event.take() {
                        return WindowOutcome::Ready(WindowBatch { batches, last_event, len });
                    }
                }

                event = stream.recv() => {
                    let Some(event) = event else {
                        return WindowOutcome::StreamClosed { discarded: len };
                    };
                    for batch in batches.iter_mut() {
                        batch.push(event.clone());
                    }
                    last_event = Some(event);
                    len += 1;

                    if len >= self.max_batch_size
                        && let Some(last_event) = last_event.take()
                    {
                        return WindowOutcome::Ready(WindowBatch { batches, last_event, len });
                    }
                }
            }
        }
    }
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
