//! `delay(duration)` - hold the pass for a fixed time
//!
//! Durations are a sequence of decimal numbers each followed by a unit
//! (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`), e.g. `300ms`, `1.5s`, `1h30m`.
//! A bare `0` is accepted. Malformed durations are rejected when the chain is
//! built.
//!
//! Passes run on the blocking pool, so sleeping here does not stall the
//! runtime.

use std::time::Duration;

use tracing::trace;

use crate::{ArgType, Ctx, Hook, HookArg, TransformError, TransformResult};

#[cfg(test)]
#[path = "delay_test.rs"]
mod tests;

pub const NAME: &str = "delay";

pub fn hook() -> Hook {
    Hook::new(NAME, vec![ArgType::Str], run).with_validator(|args| {
        let raw = args.first().and_then(HookArg::as_str).unwrap_or_default();
        parse_duration(raw).map(|_| ())
    })
}

fn run(_ctx: &mut Ctx<'_>, args: &[HookArg]) -> TransformResult<()> {
    let raw = args.first().and_then(HookArg::as_str).unwrap_or_default();
    let duration = parse_duration(raw).map_err(|e| TransformError::step_failed(NAME, e))?;
    trace!(?duration, "delaying pass");
    std::thread::sleep(duration);
    Ok(())
}

/// Parse a duration string such as `250ms` or `1m30s`
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{s}'"))?;
        if num_len == 0 {
            return Err(format!("invalid duration '{s}'"));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid number in duration '{s}'"))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            other => return Err(format!("unknown unit '{other}' in duration '{s}'")),
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return Err(format!("duration '{s}' out of range"));
    }
    Ok(Duration::from_nanos(total as u64))
}
