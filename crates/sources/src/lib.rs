//! Sluice - Sources
//!
//! The contract a change-data source implements, plus reference sources.
//!
//! # Contract
//!
//! ```text
//! init(config) → start() → [events...] ⇄ checkpoint(last) → stop()
//! ```
//!
//! - `init` validates and applies driver options
//! - `start` begins production and hands back the event stream; the stream
//!   must stay open until `stop`
//! - `checkpoint` persists resumption state derived from an event's
//!   `metadata`; it is called only once every destination accepted the batch
//!   ending in that event, and may be retried
//! - `stop` ceases production and releases resources
//!
//! # Available Sources
//!
//! | Source | Purpose |
//! |--------|---------|
//! | `memory` | Fed from a handle; records checkpoints (tests) |
//! | `generator` | Synthetic inserts on an interval (demos) |
//!
//! # Adding a Source
//!
//! Implement `Source` and register a factory under a driver name:
//!
//! ```ignore
//! registry.register_source("mysql", || Box::new(MysqlSource::default()) as Box<dyn Source>)?;
//! ```

mod error;
pub mod generator;
pub mod memory;

pub use error::{SourceError, SourceResult};
pub use generator::GeneratorSource;
pub use memory::{MemorySource, MemorySourceHandle};

use async_trait::async_trait;
use sluice_config::SourceConfig;
use sluice_protocol::ChangeEvent;
use tokio::sync::mpsc;

/// Ordered stream of events handed from a source to its pipeline
pub type EventStream = mpsc::Receiver<ChangeEvent>;

/// A change-data source
///
/// Sources are owned by exactly one pipeline and driven from its tasks, so
/// they must be `Send` but need not be `Sync`.
#[async_trait]
pub trait Source: Send {
    /// Driver name, for logging
    fn name(&self) -> &str;

    /// Validate and apply driver-specific options
    fn init(&mut self, config: &SourceConfig) -> SourceResult<()>;

    /// Begin producing events
    async fn start(&mut self) -> SourceResult<EventStream>;

    /// Persist resumption state derivable from `event`
    async fn checkpoint(&mut self, event: &ChangeEvent) -> SourceResult<()>;

    /// Cease production and release resources
    async fn stop(&mut self);
}

/// Creates fresh, uninitialised source instances
///
/// Closures `Fn() -> Box<dyn Source>` implement this.
pub trait SourceFactory: Send + Sync {
    fn create(&self) -> Box<dyn Source>;
}

impl<F> SourceFactory for F
where
    F: Fn() -> Box<dyn Source> + Send + Sync,
{
    fn create(&self) -> Box<dyn Source> {
        self()
    }
}
