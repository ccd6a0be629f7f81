//! Hook call strings
//!
//! Destinations list their hook chain as strings of the form
//! `name(arg1,arg2,...)`. Arguments are split on commas and trimmed; an
//! empty argument list (`noop()`) yields no arguments. Type coercion of the
//! arguments happens later, against the registered hook's signature.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConfigError, Result};

static HOOK_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\((.*)\)$").unwrap());

/// A parsed `name(args...)` hook call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    /// Registered hook name
    pub name: String,
    /// Raw, trimmed argument strings
    pub args: Vec<String>,
}

impl HookCall {
    /// Parse a hook call string
    ///
    /// # Errors
    ///
    /// Returns `MalformedHookCall` if the string is not `name(...)`.
    pub fn parse(call: &str) -> Result<Self> {
        let trimmed = call.trim();
        let caps = HOOK_CALL
            .captures(trimmed)
            .ok_or_else(|| ConfigError::malformed_hook_call(call))?;

        let name = caps[1].to_string();
        let raw = &caps[2];
        let args = if raw.trim().is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(|a| a.trim().to_string()).collect()
        };

        Ok(Self { name, args })
    }
}

impl std::fmt::Display for HookCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_args() {
        let call = HookCall::parse("dataFilter(db1, tbl1 ,amount,>,100)").unwrap();
        assert_eq!(call.name, "dataFilter");
        assert_eq!(call.args, vec!["db1", "tbl1", "amount", ">", "100"]);
    }

    #[test]
    fn test_parse_no_args() {
        let call = HookCall::parse("noop()").unwrap();
        assert_eq!(call.name, "noop");
        assert!(call.args.is_empty());

        let call = HookCall::parse("  noop(   )  ").unwrap();
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_parse_keeps_empty_positions() {
        let call = HookCall::parse("f(a,,b)").unwrap();
        assert_eq!(call.args, vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["", "noop", "noop(", "(1)", "bad name(1)", "f(1) trailing"] {
            let err = HookCall::parse(bad).unwrap_err();
            assert!(
                matches!(err, ConfigError::MalformedHookCall { .. }),
                "expected malformed for {bad:?}"
            );
        }
    }

    #[test]
    fn test_display() {
        let call = HookCall::parse("delay( 1s )").unwrap();
        assert_eq!(call.to_string(), "delay(1s)");
    }
}
