//! Built-in hooks
//!
//! | Hook | Arguments | Effect |
//! |------|-----------|--------|
//! | `delay` | `duration` | Holds the pass for a duration (`300ms`, `1.5s`, `1m30s`) |
//! | `dataFilter` | `db, table, field, op, value` | Drops records whose `field` compares true |
//! | `noop` | none | Passes records through |
//!
//! ```toml
//! [[pipelines.destinations]]
//! driver = "stdout"
//! hooks = ["dataFilter(-,orders,amount,<,10)", "delay(250ms)"]
//! ```

pub mod data_filter;
pub mod delay;
pub mod noop;

pub use data_filter::Operator;
pub use delay::parse_duration;

use crate::Hook;

/// Every built-in hook, ready to register
pub fn builtin_hooks() -> Vec<Hook> {
    vec![delay::hook(), data_filter::hook(), noop::hook()]
}
