//! Sluice - Transform
//!
//! Per-destination hook chains that filter and mutate change events
//! in-flight.
//!
//! # Overview
//!
//! Every destination owns a `HookChain` built from call strings such as
//! `dataFilter(db1,tbl1,amount,>,100)`. Delivering a batch to the destination
//! runs one *pass* of its chain over that destination's copy of the batch:
//!
//! ```text
//! [Batch] → [step 0] → [step 1] → ... → [Batch minus dropped records]
//! ```
//!
//! # Writing a Hook
//!
//! A hook is a synchronous function over the pass context. It iterates the
//! surviving records with `Ctx::for_each`, may wrap the rest of the chain with
//! `Ctx::next`, or end the pass early with `Ctx::abort`:
//!
//! ```
//! use sluice_transform::{ArgType, Hook, HookArg, Visit};
//!
//! let hook = Hook::new("dropTable", vec![ArgType::Str], |ctx, args| {
//!     let table = args[0].as_str().unwrap_or_default().to_string();
//!     ctx.for_each(|record| {
//!         if record.table_name() == table { Visit::DROP } else { Visit::KEEP }
//!     });
//!     Ok(())
//! });
//! assert_eq!(hook.arity(), 1);
//! ```
//!
//! A failed pass is thrown away and retried from step 0 over the full
//! original batch, so hooks must tolerate running more than once.
//!
//! # Modules
//!
//! - `chain` - Call-string parsing and pass execution
//! - `builtin` - `delay`, `dataFilter` and `noop`

mod arg;
mod chain;
mod ctx;
mod error;
mod hook;
pub mod builtin;

pub use arg::{ArgType, HookArg};
pub use builtin::builtin_hooks;
pub use chain::{HookChain, HookLookup, PassOutput};
pub use ctx::{Ctx, Visit};
pub use error::TransformError;
pub use hook::{ArgValidator, Hook, HookFn, HookStep};

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
