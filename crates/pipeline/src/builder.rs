//! Pipeline builder
//!
//! Binds a `PipelineConfig` against a `Registry`: resolves and initialises
//! the source and every destination, and parses each destination's hook
//! calls into a chain. Any failure here is a configuration error and the
//! pipeline is never created.
//!
//! ```ignore
//! let registry = Registry::with_builtins();
//! let pipeline = PipelineBuilder::from_config(&config, &registry)?.build()?;
//! pipeline.run().await?;
//! ```

use std::time::Duration;

use sluice_config::{ConfigError, PipelineConfig, StreamClosedPolicy};
use sluice_destinations::Destination;
use sluice_registry::Registry;
use sluice_sources::Source;
use sluice_transform::HookChain;
use tracing::debug;

use crate::{
    BatchWindow, DestinationSlot, Pipeline, PipelineError, PipelineSettings, Result, RetryPolicy,
};

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;

/// Assembles a `Pipeline`
pub struct PipelineBuilder {
    name: String,
    source: Option<Box<dyn Source>>,
    destinations: Vec<(String, Box<dyn Destination>, HookChain)>,
    max_batch_size: usize,
    max_wait: Option<Duration>,
    retry: RetryPolicy,
    on_stream_closed: StreamClosedPolicy,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("has_source", &self.source.is_some())
            .field("destinations", &self.destinations.len())
            .field("max_batch_size", &self.max_batch_size)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

impl PipelineBuilder {
    /// Start a pipeline with default tuning and no drivers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            destinations: Vec::new(),
            max_batch_size: sluice_config::DEFAULT_MAX_BATCH_SIZE,
            max_wait: None,
            retry: RetryPolicy::default(),
            on_stream_closed: StreamClosedPolicy::default(),
        }
    }

    /// Resolve and initialise every driver named in `config`
    pub fn from_config(config: &PipelineConfig, registry: &Registry) -> Result<Self> {
        let mut config = config.clone();
        config.normalize();
        config.validate()?;

        let mut source = registry.lookup_source(&config.source.driver)?.create();
        source.init(&config.source)?;

        let mut builder = Self::new(&config.name)
            .source(source)
            .max_batch_size(config.max_batch_size)
            .retry(RetryPolicy::from(&config.retry))
            .on_stream_closed(config.on_stream_closed);
        builder.max_wait = config.max_wait_time();

        for (index, dest) in config.destinations.iter().enumerate() {
            let mut destination = registry.lookup_destination(&dest.driver)?.create();
            destination
                .init(dest)
                .map_err(|e| PipelineError::destination(index, &dest.driver, e))?;

            let chain = HookChain::parse(&dest.hooks, registry)
                .map_err(|e| PipelineError::chain(index, &dest.driver, e))?;
            debug!(
                pipeline = %config.name,
                destination = index,
                driver = %dest.driver,
                chain = %chain,
                "destination bound"
            );

            builder = builder.destination(&dest.driver, destination, chain);
        }

        Ok(builder)
    }

    pub fn source(mut self, source: Box<dyn Source>) -> Self {
        self.source = Some(source);
        self
    }

    /// Append a destination with its hook chain
    pub fn destination(
        mut self,
        driver: impl Into<String>,
        destination: Box<dyn Destination>,
        chain: HookChain,
    ) -> Self {
        self.destinations.push((driver.into(), destination, chain));
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Flush a non-empty window after `wait`; zero disables time-based flushing
    pub fn max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn on_stream_closed(mut self, policy: StreamClosedPolicy) -> Self {
        self.on_stream_closed = policy;
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let source = self
            .source
            .ok_or_else(|| ConfigError::missing_field("pipeline", &self.name, "source"))?;
        if self.destinations.is_empty() {
            return Err(ConfigError::missing_field("pipeline", &self.name, "destinations").into());
        }

        let destinations: Vec<_> = self
            .destinations
            .into_iter()
            .enumerate()
            .map(|(index, (driver, destination, chain))| {
                DestinationSlot::new(index, driver, destination, chain)
            })
            .collect();

        let settings = PipelineSettings {
            window: BatchWindow::new(self.max_batch_size, self.max_wait, destinations.len()),
            retry: self.retry,
            on_stream_closed: self.on_stream_closed,
        };

        Ok(Pipeline::new(self.name, source, destinations, settings))
    }
}
