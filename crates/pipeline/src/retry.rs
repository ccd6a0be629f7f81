//! Retry policy - exponential backoff bounded by cancellation
//!
//! Every fallible step of a batch cycle (hook chain pass, destination write,
//! source checkpoint) is retried until it succeeds or the pipeline is
//! cancelled. There is no attempt limit: a persistently failing destination
//! stalls checkpointing but never crashes the pipeline.
//!
//! Two ways to drive it:
//!
//! ```ignore
//! // Owned operations
//! let records = policy.run("transform", &cancel, || pass(batch.clone())).await?;
//!
//! // Operations borrowing local state mutably
//! let mut retry = policy.start("write", &cancel);
//! loop {
//!     retry.begin()?;
//!     match destination.write_batch(&records).await {
//!         Ok(()) => break,
//!         Err(e) => retry.failed(e).await,
//!     }
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use sluice_config::RetryConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;

/// Boxed error kept as the cause of a cancellation
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A retried operation was abandoned because the pipeline was cancelled
#[derive(Debug)]
pub struct Cancelled {
    operation: String,
    attempts: u32,
    last_error: Option<BoxError>,
}

impl Cancelled {
    pub fn new(operation: impl Into<String>, attempts: u32, last_error: Option<BoxError>) -> Self {
        Self {
            operation: operation.into(),
            attempts,
            last_error,
        }
    }

    /// Name of the abandoned operation
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Attempts made before giving up
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Error of the last failed attempt, `None` if nothing failed yet
    pub fn last_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.last_error.as_deref()
    }
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cancelled after {} attempt(s)",
            self.operation, self.attempts
        )?;
        if let Some(e) = &self.last_error {
            write!(f, ", last error: {e}")?;
        }
        Ok(())
    }
}

impl StdError for Cancelled {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.last_error
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Exponential backoff settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    initial_interval: Duration,
    max_interval: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.initial_interval(),
            config.max_interval(),
            config.multiplier,
        )
    }
}

impl RetryPolicy {
    /// Create a policy; the cap is raised to the initial interval if lower
    /// and a multiplier below 1 is treated as 1
    pub fn new(initial_interval: Duration, max_interval: Duration, multiplier: f64) -> Self {
        let multiplier = if multiplier.is_finite() && multiplier >= 1.0 {
            multiplier
        } else {
            1.0
        };
        Self {
            initial_interval,
            max_interval: max_interval.max(initial_interval),
            multiplier,
        }
    }

    #[inline]
    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    #[inline]
    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    #[inline]
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Interval generator: no jitter, no elapsed-time limit
    fn backoff(&self) -> ExponentialBackoff {
        backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Begin retrying one operation
    pub fn start<'a>(&self, operation: &'a str, cancel: &'a CancellationToken) -> Retry<'a> {
        Retry {
            operation,
            cancel,
            backoff: self.backoff(),
            fallback: self.max_interval,
            attempts: 0,
            last_error: None,
        }
    }

    /// Run `op` until it succeeds or `cancel` fires
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, Cancelled>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError> + fmt::Display,
    {
        let mut retry = self.start(operation, cancel);
        loop {
            retry.begin()?;
            match op().await {
                Ok(value) => {
                    retry.succeeded();
                    return Ok(value);
                }
                Err(e) => retry.failed(e).await,
            }
        }
    }
}

/// State of one retried operation
pub struct Retry<'a> {
    operation: &'a str,
    cancel: &'a CancellationToken,
    backoff: ExponentialBackoff,
    fallback: Duration,
    attempts: u32,
    last_error: Option<BoxError>,
}

impl fmt::Debug for Retry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("operation", &self.operation)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl Retry<'_> {
    /// Claim the next attempt
    ///
    /// Fails with `Cancelled` once cancellation was requested, carrying the
    /// error of the last failed attempt.
    pub fn begin(&mut self) -> Result<u32, Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled::new(
                self.operation,
                self.attempts,
                self.last_error.take(),
            ));
        }
        self.attempts += 1;
        Ok(self.attempts)
    }

    /// Record a failed attempt and wait out the backoff interval
    ///
    /// Returns early when cancellation fires during the wait.
    pub async fn failed<E>(&mut self, error: E)
    where
        E: Into<BoxError> + fmt::Display,
    {
        let wait = self.backoff.next_backoff().unwrap_or(self.fallback);
        warn!(
            operation = self.operation,
            attempt = self.attempts,
            error = %error,
            retry_in_ms = wait.as_millis() as u64,
            "operation failed, retrying"
        );
        self.last_error = Some(error.into());

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(wait) => {}
        }
    }

    /// Record success
    pub fn succeeded(&self) {
        if self.attempts > 1 {
            debug!(
                operation = self.operation,
                attempts = self.attempts,
                "operation succeeded after retry"
            );
        }
    }

    /// Attempts claimed so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
