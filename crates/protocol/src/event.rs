//! Change events
//!
//! A `ChangeEvent` is one captured row mutation. Events are produced by a
//! source, copied once per destination when they enter a batch, and may then
//! be mutated in place by that destination's hook chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{DatabaseRef, TableSchema};
use crate::value::Value;

/// Column name to value mapping of one row
pub type Fields = BTreeMap<String, Value>;

/// Source-owned resumption state (log file + offset, sequence numbers, ...)
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Kind of row mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
    #[default]
    Unknown,
}

impl EventKind {
    /// Get the string name of this event kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured row mutation
///
/// Owns everything it references: cloning produces an independent deep copy
/// with no shared backing storage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub fields: Fields,
    pub table: TableSchema,
    pub database: DatabaseRef,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl ChangeEvent {
    /// Create an event with no fields and no metadata
    pub fn new(kind: EventKind, database: DatabaseRef, table: TableSchema) -> Self {
        Self {
            kind,
            fields: Fields::new(),
            table,
            database,
            metadata: Metadata::new(),
        }
    }

    /// Set a field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a metadata entry (builder style)
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[inline]
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Insert or replace a field, returning the previous value
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Name of the table this event belongs to
    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    /// Name of the database this event belongs to
    #[inline]
    pub fn database_name(&self) -> &str {
        &self.database.name
    }

    /// `database.table`, for logs
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database.name, self.table.name)
    }
}
