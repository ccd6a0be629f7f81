//! Source and destination driver configuration
//!
//! Each driver is selected by name and receives an opaque option table that
//! only the driver itself interprets.
//!
//! # Example
//!
//! ```toml
//! [pipelines.source]
//! driver = "generator"
//! options = { interval_ms = 250, table = "orders" }
//!
//! [[pipelines.destinations]]
//! driver = "stdout"
//! hooks = ["dataFilter(-,orders,amount,<,10)", "delay(1s)"]
//! ```

use serde::Deserialize;
use std::collections::HashMap;

/// Driver-specific options with typed getters
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DriverOptions(HashMap<String, toml::Value>);

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a raw option value
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }

    /// Get an option as string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    /// Get an option as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(|v| v.as_bool())
    }

    /// Get an option as f64
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(|v| v.as_float())
    }

    /// Get an option as i64
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(|v| v.as_integer())
    }

    /// Get an array option as Vec<String>
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.0.get(key).and_then(|v| {
            v.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Source descriptor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Registered source driver name
    pub driver: String,

    /// Connection string, meaning is driver-specific
    pub dsn: String,

    /// Driver-specific options
    pub options: DriverOptions,
}

impl SourceConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    pub fn with_dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = dsn.into();
        self
    }

    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }
}

/// Destination descriptor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Registered destination driver name
    pub driver: String,

    /// Connection URL, meaning is driver-specific
    pub url: String,

    /// Driver-specific options
    pub options: DriverOptions,

    /// Ordered hook calls in `name(arg1,arg2,...)` form
    pub hooks: Vec<String>,
}

impl DestinationConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Append a hook call (builder style)
    pub fn with_hook(mut self, call: impl Into<String>) -> Self {
        self.hooks.push(call.into());
        self
    }
}
