//! Hook Chain - Ordered per-destination transform steps
//!
//! A `HookChain` is built once from a destination's call strings and then
//! run as many times as needed. Every run is a *pass*: a fresh `Ctx` over the
//! batch, steps executed from position 0, dropped records removed from the
//! output.
//!
//! # Design
//!
//! - **Empty chain is free**: passes through the batch untouched
//! - **Stateless between passes**: cursor, abort flag, error and drop markers
//!   live in the `Ctx`, never in the chain
//! - **First error wins**: a failing step halts advancement; the error is
//!   returned alongside whatever records survived

use std::collections::HashMap;
use std::sync::Arc;

use sluice_config::HookCall;
use sluice_protocol::ChangeEvent;
use tracing::debug;

use crate::{Ctx, Hook, HookStep, TransformError, TransformResult};

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;

/// Resolves hook names while a chain is built
pub trait HookLookup {
    fn find_hook(&self, name: &str) -> Option<Arc<Hook>>;
}

impl HookLookup for HashMap<String, Arc<Hook>> {
    fn find_hook(&self, name: &str) -> Option<Arc<Hook>> {
        self.get(name).cloned()
    }
}

impl<T: HookLookup + ?Sized> HookLookup for &T {
    fn find_hook(&self, name: &str) -> Option<Arc<Hook>> {
        (**self).find_hook(name)
    }
}

/// Outcome of one pass
#[derive(Debug)]
pub struct PassOutput {
    /// Records not dropped, in input order
    pub records: Vec<ChangeEvent>,
    /// Number of records dropped by steps
    pub dropped: usize,
    /// First step error, if any
    pub error: Option<TransformError>,
}

impl PassOutput {
    /// Convert into a result, discarding the records of a failed pass
    pub fn into_result(self) -> TransformResult<Vec<ChangeEvent>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }
}

/// Ordered list of bound hook steps
#[derive(Debug, Clone, Default)]
pub struct HookChain {
    steps: Vec<HookStep>,
}

impl HookChain {
    /// Create a chain from already-bound steps
    pub fn new(steps: Vec<HookStep>) -> Self {
        Self { steps }
    }

    /// Create an empty chain (no-op)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a chain from `name(arg, ...)` call strings
    ///
    /// # Errors
    ///
    /// - `InvalidCall` if a string is not a hook call
    /// - `UnknownHook` if a name does not resolve
    /// - `ArgCount`, `ArgType` or `InvalidArgument` if binding fails
    pub fn parse<S, L>(calls: &[S], hooks: L) -> TransformResult<Self>
    where
        S: AsRef<str>,
        L: HookLookup,
    {
        let mut steps = Vec::with_capacity(calls.len());
        for call in calls {
            let call = call.as_ref();
            let parsed = HookCall::parse(call).map_err(|_| TransformError::invalid_call(call))?;
            let hook = hooks
                .find_hook(&parsed.name)
                .ok_or_else(|| TransformError::unknown_hook(&parsed.name))?;
            let step = hook.bind(&parsed.args)?;
            debug!(hook = %step.name(), args = ?step.args(), "hook bound");
            steps.push(step);
        }
        Ok(Self { steps })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps, in order
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn steps(&self) -> &[HookStep] {
        &self.steps
    }

    /// Run one pass over `batch`
    ///
    /// The batch is consumed; callers that may retry keep their own copy and
    /// hand a fresh clone to every attempt.
    pub fn pass_through(&self, mut batch: Vec<ChangeEvent>) -> PassOutput {
        if self.steps.is_empty() {
            return PassOutput {
                records: batch,
                dropped: 0,
                error: None,
            };
        }

        let (markers, error) = {
            let mut ctx = Ctx::new(&self.steps, &mut batch);
            ctx.run();
            ctx.finish()
        };

        let input = batch.len();
        let records: Vec<ChangeEvent> = batch
            .into_iter()
            .zip(markers)
            .filter_map(|(record, dropped)| (!dropped).then_some(record))
            .collect();

        PassOutput {
            dropped: input - records.len(),
            records,
            error,
        }
    }

    /// Run one pass, failing if any step failed
    pub fn try_pass_through(&self, batch: Vec<ChangeEvent>) -> TransformResult<Vec<ChangeEvent>> {
        self.pass_through(batch).into_result()
    }
}

impl std::fmt::Display for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
