//! Table and database descriptions
//!
//! Sources produce one `TableSchema` per observed table and attach a copy to
//! every event of that table. Column metadata carries type-specific decoding
//! hints (enum labels, datetime format strings, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form decoding hints for a column
pub type ColumnMetadata = BTreeMap<String, serde_json::Value>;

/// Column type as reported by the source
///
/// The type determines which `Value` variant the source places in
/// `ChangeEvent::fields` for this column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Structured (json, set, geometry...) - no fixed value type
    Struct,
    /// Type the source could not classify
    #[default]
    Unknown,
    /// Integer column, values are `Value::Int`
    Number,
    /// Enum column, values are `Value::String` labels
    Enum,
    /// Floating point or decimal column, values are `Value::Float`
    Float,
    /// Text column, values are `Value::String`
    String,
    /// Binary column, values are `Value::Bytes`
    Bytes,
    /// Date/time column, values are `Value::Timestamp`
    Datetime,
}

impl ColumnType {
    /// Get the string name of this column type
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Unknown => "unknown",
            Self::Number => "number",
            Self::Enum => "enum",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Datetime => "datetime",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column of a table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ColumnMetadata,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            metadata: ColumnMetadata::new(),
        }
    }

    /// Attach a decoding hint
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Ordered column list of one table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column (builder style)
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column in the table, if present
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Number of columns
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Database an event belongs to (name only)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DatabaseRef {
    pub name: String,
}

impl DatabaseRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for DatabaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
