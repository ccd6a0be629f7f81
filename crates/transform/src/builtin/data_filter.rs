//! `dataFilter(db, table, field, op, value)` - drop matching records
//!
//! A record is dropped when it belongs to `db`.`table` (`-` matches any),
//! carries `field`, and `field op value` holds.
//!
//! ## Operators
//!
//! | Operator | Description |
//! |----------|-------------|
//! | `=` | Equal to value |
//! | `!=` | Not equal to value |
//! | `>` | Greater than |
//! | `>=` | Greater than or equal |
//! | `<` | Less than |
//! | `<=` | Less than or equal |
//!
//! String fields compare lexically. Integer, float and timestamp fields
//! compare numerically (timestamps as unix seconds); if `value` does not
//! parse as a number such records never match. Byte fields never match.

use std::cmp::Ordering;
use std::fmt;

use sluice_protocol::{ChangeEvent, Value};
use tracing::debug;

use crate::{ArgType, Ctx, Hook, HookArg, TransformError, TransformResult, Visit};

#[cfg(test)]
#[path = "data_filter_test.rs"]
mod tests;

pub const NAME: &str = "dataFilter";

/// Matches any database or table name
pub const WILDCARD: &str = "-";

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            other => Err(format!("unknown operator '{other}'")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// Apply the operator to `lhs op rhs`
    pub fn compare<T: PartialOrd + ?Sized>(&self, lhs: &T, rhs: &T) -> bool {
        let Some(ord) = lhs.partial_cmp(rhs) else {
            return false;
        };
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Gt => ord == Ordering::Greater,
            Self::Gte => ord != Ordering::Less,
            Self::Lt => ord == Ordering::Less,
            Self::Lte => ord != Ordering::Greater,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coerced `dataFilter` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct DataFilter {
    pub database: String,
    pub table: String,
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl DataFilter {
    pub fn from_args(args: &[HookArg]) -> Result<Self, String> {
        let [database, table, field, operator, value] = args else {
            return Err(format!("expected 5 arguments, got {}", args.len()));
        };
        let text = |arg: &HookArg| arg.as_str().map(str::to_string);
        let missing = || "arguments must be strings".to_string();

        Ok(Self {
            database: text(database).ok_or_else(missing)?,
            table: text(table).ok_or_else(missing)?,
            field: text(field).ok_or_else(missing)?,
            operator: Operator::parse(operator.as_str().ok_or_else(missing)?)?,
            value: text(value).ok_or_else(missing)?,
        })
    }

    /// Whether this filter applies to and matches `record`
    pub fn matches(&self, record: &ChangeEvent) -> bool {
        if self.database != WILDCARD && record.database_name() != self.database {
            return false;
        }
        if self.table != WILDCARD && record.table_name() != self.table {
            return false;
        }
        let Some(value) = record.field(&self.field) else {
            return false;
        };

        match value {
            Value::String(s) => self.operator.compare(s.as_str(), self.value.as_str()),
            Value::Bytes(_) => false,
            Value::Int(_) | Value::Float(_) | Value::Timestamp(_) => {
                match (value.as_number(), self.value.trim().parse::<f64>()) {
                    (Some(lhs), Ok(rhs)) => self.operator.compare(&lhs, &rhs),
                    _ => false,
                }
            }
        }
    }
}

pub fn hook() -> Hook {
    Hook::new(NAME, vec![ArgType::Str; 5], run)
        .with_validator(|args| DataFilter::from_args(args).map(|_| ()))
}

fn run(ctx: &mut Ctx<'_>, args: &[HookArg]) -> TransformResult<()> {
    let filter = DataFilter::from_args(args).map_err(|e| TransformError::step_failed(NAME, e))?;
    let dropped = ctx.for_each(|record| {
        if filter.matches(record) {
            Visit::DROP
        } else {
            Visit::KEEP
        }
    });
    if dropped > 0 {
        debug!(
            field = %filter.field,
            op = %filter.operator,
            value = %filter.value,
            dropped,
            "records filtered"
        );
    }
    Ok(())
}
