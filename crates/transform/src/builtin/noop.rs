//! `noop()` - pass records through unchanged
//!
//! Useful for checking that a destination's chain is wired up.

use crate::Hook;

pub const NAME: &str = "noop";

pub fn hook() -> Hook {
    Hook::new(NAME, Vec::new(), |_ctx, _args| Ok(()))
}
