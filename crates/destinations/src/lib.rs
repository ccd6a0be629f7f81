//! Sluice - Destinations
//!
//! The contract a destination implements, plus reference destinations.
//!
//! # Contract
//!
//! ```text
//! init(config) → start() → write_batch(records)* → stop()
//! ```
//!
//! - `start` checks connectivity; a failure aborts pipeline start-up
//! - `write_batch` receives the records that survived the destination's hook
//!   chain, in source order, and must durably persist them before returning
//!   `Ok`. A failed write is retried with the same records.
//!
//! Delivery is at-least-once: a crash between a write and the source
//! checkpoint replays the batch, so writes should be idempotent where the
//! target allows it.
//!
//! # Available Destinations
//!
//! | Destination | Purpose |
//! |-------------|---------|
//! | `null` | Discard everything, count records (benchmarks, wiring checks) |
//! | `stdout` | One JSON line per record |
//! | `memory` | Record batches, inject failures (tests) |

// =============================================================================
// Destination implementations (each in its own submodule)
// =============================================================================

/// Memory destination - recording test double
pub mod memory;

/// Null destination - discards all records
pub mod null;

/// Stdout destination - JSON lines
pub mod stdout;

mod error;

// =============================================================================
// Public re-exports
// =============================================================================

pub use error::{DestinationError, DestinationResult};
pub use memory::{MemoryDestination, MemoryDestinationHandle};
pub use null::NullDestination;
pub use stdout::StdoutDestination;

use async_trait::async_trait;
use sluice_config::DestinationConfig;
use sluice_protocol::ChangeEvent;

/// A place batches are written to
#[async_trait]
pub trait Destination: Send {
    /// Driver name, for logging
    fn name(&self) -> &str;

    /// Validate and apply driver-specific options
    fn init(&mut self, config: &DestinationConfig) -> DestinationResult<()>;

    /// Check connectivity before the pipeline starts
    async fn start(&mut self) -> DestinationResult<()>;

    /// Durably write one batch
    async fn write_batch(&mut self, records: &[ChangeEvent]) -> DestinationResult<()>;

    /// Release resources
    async fn stop(&mut self);
}

/// Creates fresh, uninitialised destination instances
///
/// Closures `Fn() -> Box<dyn Destination>` implement this.
pub trait DestinationFactory: Send + Sync {
    fn create(&self) -> Box<dyn Destination>;
}

impl<F> DestinationFactory for F
where
    F: Fn() -> Box<dyn Destination> + Send + Sync,
{
    fn create(&self) -> Box<dyn Destination> {
        self()
    }
}
