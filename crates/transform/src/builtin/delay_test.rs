use super::*;
use crate::HookChain;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[test]
fn test_parse_simple_units() {
    assert_eq!(parse_duration("300ms"), Ok(Duration::from_millis(300)));
    assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
    assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
    assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
    assert_eq!(parse_duration("7ns"), Ok(Duration::from_nanos(7)));
}

#[test]
fn test_parse_fractional_and_compound() {
    assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
    assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
    assert_eq!(parse_duration("1h1m1s"), Ok(Duration::from_secs(3661)));
}

#[test]
fn test_parse_zero() {
    assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    assert_eq!(parse_duration("0s"), Ok(Duration::ZERO));
}

#[test]
fn test_parse_rejects_malformed() {
    for bad in ["", "5", "s", "1x", "1.2.3s", "-1s", "1s x"] {
        assert!(parse_duration(bad).is_err(), "expected error for {bad:?}");
    }
}

#[test]
fn test_validator_rejects_bad_duration_at_build() {
    let hook = hook();
    let err = hook.bind(&["soon".to_string()]).unwrap_err();
    assert!(matches!(err, TransformError::InvalidArgument { .. }));
}

#[test]
fn test_delay_holds_pass() {
    let mut hooks = HashMap::new();
    hooks.insert(NAME.to_string(), Arc::new(hook()));
    let chain = HookChain::parse(&["delay(20ms)"], &hooks).unwrap();

    let start = Instant::now();
    let out = chain.pass_through(Vec::new());
    assert!(out.error.is_none());
    assert!(start.elapsed() >= Duration::from_millis(20));
}
