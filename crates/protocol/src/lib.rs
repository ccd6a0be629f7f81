//! Sluice Protocol - Core change-event types
//!
//! This crate provides the foundational types that flow through the pipeline:
//! - `ChangeEvent` - One captured row mutation (insert, update, delete)
//! - `Value` - Closed set of column value types
//! - `TableSchema` / `Column` / `ColumnType` - Table description from the source
//! - `DatabaseRef` - Database the row belongs to
//!
//! # Design Principles
//!
//! - **Value semantics**: A `ChangeEvent` owns its schema, fields and metadata.
//!   `Clone` is a full deep copy, so every destination gets an independent copy
//!   it can mutate without affecting any other destination.
//! - **Exhaustive matching**: Field values are a closed tagged union rather than
//!   an open dynamic type; destinations and hooks match on `Value` directly.
//! - **Opaque resumption state**: `metadata` belongs to the source that produced
//!   the event (binlog file + offset, sequence numbers, ...).

mod event;
mod schema;
mod value;

pub use event::{ChangeEvent, EventKind, Fields, Metadata};
pub use schema::{Column, ColumnMetadata, ColumnType, DatabaseRef, TableSchema};
pub use value::Value;
