//! Sluice - Pipeline
//!
//! Moves change events from one source to many destinations in batches.
//!
//! # Architecture
//!
//! ```text
//! [Source] ──EventStream──→ [BatchWindow] ──┬──→ [HookChain] → [write] → dest 0 ──┐
//!    ↑                      size or time    ├──→ [HookChain] → [write] → dest 1 ──┼──→ join
//!    │                                      └──→ [HookChain] → [write] → dest 2 ──┘     │
//!    └──────────────────── checkpoint(last event) ←──── all succeeded ←─────────────────┘
//! ```
//!
//! # Key Design
//!
//! - **Per-destination copies**: every destination gets its own clone of each
//!   event, so one destination's hooks never affect another's records
//! - **At-least-once**: the source checkpoint only advances after every
//!   destination accepted the batch
//! - **Retry until stopped**: hook passes, writes, checkpoints and source
//!   restarts back off exponentially and only give up on cancellation
//! - **Single-owner drivers**: the main-loop task owns the source and
//!   destinations while running and hands them back on `stop`
//!
//! # Example
//!
//! ```ignore
//! use sluice_pipeline::PipelineBuilder;
//! use sluice_registry::Registry;
//!
//! let registry = Registry::with_builtins();
//! let pipeline = PipelineBuilder::from_config(&config, &registry)?.build()?;
//!
//! pipeline.run().await?;
//! // ...
//! pipeline.stop().await;
//! ```

mod builder;
mod error;
mod fanout;
mod metrics;
mod pipeline;
mod retry;
mod window;

pub use builder::PipelineBuilder;
pub use error::{PipelineError, Result};
pub use fanout::{DestinationSlot, FanOutWriter};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{Pipeline, PipelineSettings, PipelineState};
pub use retry::{BoxError, Cancelled, Retry, RetryPolicy};
pub use window::{BatchWindow, WindowBatch, WindowOutcome};

pub use sluice_config::StreamClosedPolicy;
