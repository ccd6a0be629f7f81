//! Fan-out writer - concurrent per-destination delivery
//!
//! For one closed window, every destination gets its own task:
//!
//! ```text
//!              ┌─→ [hook chain pass]* → [write]* → dest 0 ─┐
//! [window] ────┼─→ [hook chain pass]* → [write]* → dest 1 ─┼──→ join → Ok / Cancelled
//!              └─→ [hook chain pass]* → [write]* → dest 2 ─┘
//!                        (* = retried until success or cancellation)
//! ```
//!
//! Each task owns its destination and batch copy for the duration of the
//! delivery and hands them back on join; no task outlives its window.

use std::panic;
use std::sync::Arc;

use sluice_destinations::Destination;
use sluice_protocol::ChangeEvent;
use sluice_transform::HookChain;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Cancelled, PipelineMetrics, RetryPolicy};

/// A destination bound into a pipeline, with its hook chain
pub struct DestinationSlot {
    index: usize,
    driver: String,
    destination: Box<dyn Destination>,
    chain: Arc<HookChain>,
}

impl std::fmt::Debug for DestinationSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationSlot")
            .field("index", &self.index)
            .field("driver", &self.driver)
            .field("chain", &self.chain.to_string())
            .finish()
    }
}

impl DestinationSlot {
    pub fn new(
        index: usize,
        driver: impl Into<String>,
        destination: Box<dyn Destination>,
        chain: HookChain,
    ) -> Self {
        Self {
            index,
            driver: driver.into(),
            destination,
            chain: Arc::new(chain),
        }
    }

    /// Position in the pipeline's destination list
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn driver(&self) -> &str {
        &self.driver
    }

    #[inline]
    pub fn chain(&self) -> &HookChain {
        &self.chain
    }

    pub fn destination_mut(&mut self) -> &mut dyn Destination {
        self.destination.as_mut()
    }

    fn label(&self) -> String {
        format!("destination #{} ({})", self.index, self.driver)
    }
}

/// Delivers one window to every destination concurrently
#[derive(Debug, Clone)]
pub struct FanOutWriter {
    pipeline: Arc<str>,
    retry: RetryPolicy,
    metrics: Arc<PipelineMetrics>,
}

impl FanOutWriter {
    pub fn new(pipeline: Arc<str>, retry: RetryPolicy, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            pipeline,
            retry,
            metrics,
        }
    }

    /// Run each destination's chain and write over its batch, then join
    ///
    /// `batches[i]` belongs to `slots[i]`. The slots come back in the same
    /// order. Success means every destination succeeded; otherwise the first
    /// cancellation is returned.
    pub async fn deliver(
        &self,
        slots: Vec<DestinationSlot>,
        batches: Vec<Vec<ChangeEvent>>,
        cancel: &CancellationToken,
    ) -> (Vec<DestinationSlot>, Result<(), Cancelled>) {
        debug_assert_eq!(slots.len(), batches.len());

        let handles: Vec<_> = slots
            .into_iter()
            .zip(batches)
            .map(|(mut slot, batch)| {
                let writer = self.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let result = writer.deliver_one(&mut slot, batch, &cancel).await;
                    (slot, result)
                })
            })
            .collect();

        let mut slots = Vec::with_capacity(handles.len());
        let mut outcome = Ok(());
        for handle in handles {
            let (slot, result) = match handle.await {
                Ok(joined) => joined,
                Err(err) => resume_panic(err),
            };
            if let Err(cancelled) = result
                && outcome.is_ok()
            {
                outcome = Err(cancelled);
            }
            slots.push(slot);
        }
        (slots, outcome)
    }

    async fn deliver_one(
        &self,
        slot: &mut DestinationSlot,
        batch: Vec<ChangeEvent>,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let records = if slot.chain.is_empty() {
            batch
        } else {
            let chain = Arc::clone(&slot.chain);
            self.transform(slot.index, &slot.label(), chain, batch, cancel)
                .await?
        };

        if records.is_empty() {
            debug!(
                pipeline = %self.pipeline,
                destination = slot.index,
                driver = %slot.driver,
                "every record dropped by hooks, skipping write"
            );
            return Ok(());
        }

        let operation = format!("write to {}", slot.label());
        let mut retry = self.retry.start(&operation, cancel);
        loop {
            retry.begin()?;
            match slot.destination.write_batch(&records).await {
                Ok(()) => {
                    retry.succeeded();
                    break;
                }
                Err(e) => {
                    self.metrics.record_write_failure();
                    retry.failed(e).await;
                }
            }
        }

        self.metrics.record_written(records.len() as u64);
        debug!(
            pipeline = %self.pipeline,
            destination = slot.index,
            driver = %slot.driver,
            records = records.len(),
            "batch written"
        );
        Ok(())
    }

    /// Run the chain until a pass succeeds; every pass starts from the full
    /// original batch on the blocking pool
    async fn transform(
        &self,
        index: usize,
        label: &str,
        chain: Arc<HookChain>,
        batch: Vec<ChangeEvent>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChangeEvent>, Cancelled> {
        let batch = Arc::new(batch);
        let operation = format!("hook chain of {label}");
        let metrics = &self.metrics;

        let output = self
            .retry
            .run(&operation, cancel, || {
                let chain = Arc::clone(&chain);
                let input = Arc::clone(&batch);
                async move {
                    let pass = tokio::task::spawn_blocking(move || {
                        chain.pass_through(input.to_vec())
                    });
                    let mut output = match pass.await {
                        Ok(output) => output,
                        Err(err) => resume_panic(err),
                    };
                    if let Some(e) = output.error.take() {
                        metrics.record_transform_failure();
                        return Err(e);
                    }
                    Ok(output)
                }
            })
            .await?;

        if output.dropped > 0 {
            self.metrics.record_dropped(output.dropped as u64);
            debug!(
                pipeline = %self.pipeline,
                destination = index,
                dropped = output.dropped,
                remaining = output.records.len(),
                "records dropped by hooks"
            );
        }
        Ok(output.records)
    }
}

/// Re-raise a panic from a joined task
///
/// Pipeline tasks are never aborted, so a join error is always a panic.
pub(crate) fn resume_panic(err: JoinError) -> ! {
    match err.try_into_panic() {
        Ok(payload) => panic::resume_unwind(payload),
        Err(err) => unreachable!("pipeline task was aborted: {err}"),
    }
}
