//! Pass execution state
//!
//! A `Ctx` lives for exactly one pass of a chain over one batch. It owns the
//! cursor, the abort flag, the first error and the drop markers, so nothing
//! leaks between passes: a retry always starts from a fresh `Ctx`.

use sluice_protocol::ChangeEvent;
use tracing::{trace, warn};

use crate::{HookStep, TransformError};

/// What a step decides for one record during `Ctx::for_each`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visit {
    /// Exclude the record from later steps and from the pass output
    pub drop: bool,
    /// End this step's iteration early (the chain still advances)
    pub stop: bool,
}

impl Visit {
    pub const KEEP: Self = Self {
        drop: false,
        stop: false,
    };
    pub const DROP: Self = Self {
        drop: true,
        stop: false,
    };
    pub const STOP: Self = Self {
        drop: false,
        stop: true,
    };

    pub const fn new(drop: bool, stop: bool) -> Self {
        Self { drop, stop }
    }
}

/// Per-pass execution state handed to every step
pub struct Ctx<'a> {
    steps: &'a [HookStep],
    records: &'a mut [ChangeEvent],
    dropped: Vec<bool>,
    cursor: usize,
    aborted: bool,
    error: Option<TransformError>,
}

impl<'a> Ctx<'a> {
    pub(crate) fn new(steps: &'a [HookStep], records: &'a mut [ChangeEvent]) -> Self {
        let dropped = vec![false; records.len()];
        Self {
            steps,
            records,
            dropped,
            cursor: 0,
            aborted: false,
            error: None,
        }
    }

    /// Run steps from the cursor to the end of the chain
    ///
    /// The cursor advances after every step whatever its outcome; advancing
    /// stops once the pass is aborted or has failed.
    pub(crate) fn run(&mut self) {
        let steps = self.steps;
        while let Some(step) = steps.get(self.cursor) {
            if self.aborted || self.error.is_some() {
                return;
            }
            trace!(hook = %step.name, position = self.cursor, "running hook");
            if let Err(e) = (step.func)(self, &step.args) {
                trace!(hook = %step.name, error = %e, "hook failed");
                if self.error.is_none() {
                    self.error = Some(e);
                }
            }
            self.cursor += 1;
        }
    }

    /// Consume the context, returning the drop markers and the pass error
    pub(crate) fn finish(self) -> (Vec<bool>, Option<TransformError>) {
        (self.dropped, self.error)
    }

    /// Visit every record not yet dropped, in order
    ///
    /// Returns the number of records dropped by this call.
    pub fn for_each<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&mut ChangeEvent) -> Visit,
    {
        let mut dropped = 0;
        for (record, gone) in self.records.iter_mut().zip(self.dropped.iter_mut()) {
            if *gone {
                continue;
            }
            let visit = f(record);
            if visit.drop {
                *gone = true;
                dropped += 1;
            }
            if visit.stop {
                break;
            }
        }
        dropped
    }

    /// Run the rest of the chain now, then return to the calling step
    pub fn next(&mut self) {
        if self.cursor >= self.steps.len() {
            warn!(
                position = self.cursor,
                steps = self.steps.len(),
                "next() called past the end of the hook chain"
            );
            return;
        }
        self.cursor += 1;
        self.run();
    }

    /// Stop the pass: no further steps run
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Whether a step has already failed in this pass
    #[inline]
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Batch length, dropped records included
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records not yet dropped
    pub fn remaining(&self) -> usize {
        self.dropped.iter().filter(|d| !**d).count()
    }

    /// Name of the step at the cursor
    pub fn step_name(&self) -> Option<&'a str> {
        self.steps.get(self.cursor).map(|s| s.name.as_str())
    }

    /// Position of the cursor in the chain
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }
}
