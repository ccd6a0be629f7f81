//! Tests for hook chain parsing and pass execution

use super::*;
use crate::{ArgType, HookArg, Visit};
use sluice_protocol::{DatabaseRef, EventKind, TableSchema, Value};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn record(id: i64) -> ChangeEvent {
    ChangeEvent::new(
        EventKind::Insert,
        DatabaseRef::new("db1"),
        TableSchema::new("tbl1"),
    )
    .with_field("id", id)
}

fn batch(n: i64) -> Vec<ChangeEvent> {
    (0..n).map(record).collect()
}

fn ids(records: &[ChangeEvent]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.field("id").and_then(Value::as_i64))
        .collect()
}

fn registry(hooks: Vec<Hook>) -> HashMap<String, Arc<Hook>> {
    hooks
        .into_iter()
        .map(|h| (h.name().to_string(), Arc::new(h)))
        .collect()
}

/// Drops records whose id is divisible by the argument
fn drop_multiples() -> Hook {
    Hook::new("dropMultiples", vec![ArgType::Int], |ctx, args| {
        let n = args[0].as_int().unwrap_or(1);
        ctx.for_each(|r| {
            let id = r.field("id").and_then(Value::as_i64).unwrap_or_default();
            Visit::new(id % n == 0, false)
        });
        Ok(())
    })
}

#[test]
fn test_empty_chain_passes_batch_through() {
    let chain = HookChain::empty();
    assert!(chain.is_empty());
    assert_eq!(chain.len(), 0);

    let out = chain.pass_through(batch(3));
    assert_eq!(ids(&out.records), vec![0, 1, 2]);
    assert_eq!(out.dropped, 0);
    assert!(out.error.is_none());
}

#[test]
fn test_parse_binds_string_args() {
    let hooks = registry(vec![Hook::new(
        "dataFilter",
        vec![ArgType::Str; 5],
        |_, _| Ok(()),
    )]);

    let chain = HookChain::parse(&["dataFilter(db1,tbl1,amount,>,100)"], &hooks).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.names(), vec!["dataFilter"]);

    let args: Vec<_> = chain.steps()[0]
        .args()
        .iter()
        .map(|a| a.as_str().unwrap().to_string())
        .collect();
    assert_eq!(args, vec!["db1", "tbl1", "amount", ">", "100"]);
}

#[test]
fn test_parse_arity_mismatch() {
    let hooks = registry(vec![Hook::new(
        "dataFilter",
        vec![ArgType::Str; 4],
        |_, _| Ok(()),
    )]);

    let err = HookChain::parse(&["dataFilter(db1,tbl1,amount,>,100)"], &hooks).unwrap_err();
    assert!(matches!(
        err,
        TransformError::ArgCount {
            expected: 4,
            actual: 5,
            ..
        }
    ));
    assert!(err.is_build_error());
}

#[test]
fn test_parse_zero_args() {
    let hooks = registry(vec![Hook::new("noop", Vec::new(), |_, _| Ok(()))]);
    assert!(HookChain::parse(&["noop()"], &hooks).is_ok());

    let err = HookChain::parse(&["noop(x)"], &hooks).unwrap_err();
    assert!(matches!(err, TransformError::ArgCount { .. }));
}

#[test]
fn test_parse_coerces_typed_args() {
    let hooks = registry(vec![Hook::new(
        "typed",
        vec![ArgType::Int, ArgType::Float, ArgType::Str],
        |_, _| Ok(()),
    )]);

    let chain = HookChain::parse(&["typed( 42 , 1.5 , hello world )"], &hooks).unwrap();
    assert_eq!(
        chain.steps()[0].args(),
        &[
            HookArg::Int(42),
            HookArg::Float(1.5),
            HookArg::Str("hello world".into())
        ]
    );

    let err = HookChain::parse(&["typed(4.2,1.5,x)"], &hooks).unwrap_err();
    assert!(matches!(err, TransformError::ArgType { index: 0, .. }));

    let err = HookChain::parse(&["typed(4,abc,x)"], &hooks).unwrap_err();
    assert!(matches!(
        err,
        TransformError::ArgType {
            index: 1,
            expected: ArgType::Float,
            ..
        }
    ));
}

#[test]
fn test_parse_runs_validator_after_coercion() {
    let hook = Hook::new("positive", vec![ArgType::Int], |_, _| Ok(())).with_validator(|args| {
        match args[0].as_int() {
            Some(n) if n > 0 => Ok(()),
            _ => Err("must be positive".into()),
        }
    });
    let hooks = registry(vec![hook]);

    assert!(HookChain::parse(&["positive(3)"], &hooks).is_ok());
    let err = HookChain::parse(&["positive(-3)"], &hooks).unwrap_err();
    assert!(matches!(err, TransformError::InvalidArgument { .. }));
    assert!(err.to_string().contains("must be positive"));
}

#[test]
fn test_parse_unknown_hook() {
    let hooks = registry(Vec::new());
    let err = HookChain::parse(&["missing()"], &hooks).unwrap_err();
    assert!(matches!(err, TransformError::UnknownHook { ref name } if name == "missing"));
}

#[test]
fn test_parse_invalid_call() {
    let hooks = registry(vec![drop_multiples()]);
    for bad in ["dropMultiples", "dropMultiples(2", "2(x)"] {
        let err = HookChain::parse(&[bad], &hooks).unwrap_err();
        assert!(matches!(err, TransformError::InvalidCall { .. }), "{bad}");
    }
}

#[test]
fn test_result_preserves_order_and_count() {
    let hooks = registry(vec![drop_multiples()]);
    let chain = HookChain::parse(&["dropMultiples(3)"], &hooks).unwrap();

    let out = chain.pass_through(batch(10));
    assert_eq!(ids(&out.records), vec![1, 2, 4, 5, 7, 8]);
    assert_eq!(out.dropped, 4);
    assert_eq!(out.records.len(), 10 - out.dropped);
}

#[test]
fn test_dropped_records_hidden_from_later_steps() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let observer = Hook::new("observe", Vec::new(), move |ctx, _| {
        ctx.for_each(|r| {
            seen_clone
                .lock()
                .unwrap()
                .push(r.field("id").and_then(Value::as_i64).unwrap_or_default());
            Visit::KEEP
        });
        Ok(())
    });
    let hooks = registry(vec![drop_multiples(), observer]);
    let chain = HookChain::parse(&["dropMultiples(2)", "observe()"], &hooks).unwrap();

    let out = chain.pass_through(batch(6));
    assert_eq!(ids(&out.records), vec![1, 3, 5]);
    assert_eq!(*seen.lock().unwrap(), vec![1, 3, 5]);
}

#[test]
fn test_mutation_visible_in_output() {
    let hook = Hook::new("double", Vec::new(), |ctx, _| {
        ctx.for_each(|r| {
            if let Some(Value::Int(id)) = r.field_mut("id") {
                *id *= 2;
            }
            Visit::KEEP
        });
        Ok(())
    });
    let chain = HookChain::parse(&["double()"], registry(vec![hook])).unwrap();
    let out = chain.pass_through(batch(3));
    assert_eq!(ids(&out.records), vec![0, 2, 4]);
}

#[test]
fn test_stop_ends_only_current_iteration() {
    let visited = Arc::new(AtomicUsize::new(0));
    let visited_clone = Arc::clone(&visited);
    let first_two = Hook::new("dropFirst", Vec::new(), |ctx, _| {
        ctx.for_each(|_| Visit::new(true, true));
        Ok(())
    });
    let count = Hook::new("count", Vec::new(), move |ctx, _| {
        ctx.for_each(|_| {
            visited_clone.fetch_add(1, Ordering::SeqCst);
            Visit::KEEP
        });
        Ok(())
    });
    let hooks = registry(vec![first_two, count]);
    let chain = HookChain::parse(&["dropFirst()", "count()"], &hooks).unwrap();

    let out = chain.pass_through(batch(4));
    assert_eq!(ids(&out.records), vec![1, 2, 3]);
    assert_eq!(visited.load(Ordering::SeqCst), 3);
}

#[test]
fn test_next_wraps_rest_of_chain() {
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    let l = Arc::clone(&log);
    let outer = Hook::new("outer", Vec::new(), move |ctx, _| {
        l.lock().unwrap().push(format!("before:{}", ctx.remaining()));
        ctx.next();
        l.lock().unwrap().push(format!("after:{}", ctx.remaining()));
        Ok(())
    });
    let l = Arc::clone(&log);
    let inner = Hook::new("inner", Vec::new(), move |_, _| {
        l.lock().unwrap().push("inner".to_string());
        Ok(())
    });
    let l = Arc::clone(&log);
    let last = Hook::new("last", Vec::new(), move |_, _| {
        l.lock().unwrap().push("last".to_string());
        Ok(())
    });

    let hooks = registry(vec![outer, inner, last, drop_multiples()]);
    let chain = HookChain::parse(
        &["outer()", "dropMultiples(2)", "inner()", "last()"],
        &hooks,
    )
    .unwrap();

    let out = chain.pass_through(batch(4));
    assert!(out.error.is_none());
    assert_eq!(ids(&out.records), vec![1, 3]);
    // every later step ran exactly once, and before outer's "after" logic
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before:4", "inner", "last", "after:2"]
    );
}

#[test]
fn test_next_from_last_step_is_harmless() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let hook = Hook::new("tail", Vec::new(), move |ctx, _| {
        c.fetch_add(1, Ordering::SeqCst);
        ctx.next();
        ctx.next();
        Ok(())
    });
    let chain = HookChain::parse(&["tail()"], registry(vec![hook])).unwrap();
    let out = chain.pass_through(batch(2));
    assert!(out.error.is_none());
    assert_eq!(out.records.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_abort_stops_later_steps() {
    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    let abort = Hook::new("abort", Vec::new(), |ctx, _| {
        ctx.abort();
        Ok(())
    });
    let after = Hook::new("after", Vec::new(), move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let hooks = registry(vec![drop_multiples(), abort, after]);
    let chain =
        HookChain::parse(&["dropMultiples(2)", "abort()", "after()"], &hooks).unwrap();

    let out = chain.pass_through(batch(4));
    assert!(out.error.is_none());
    assert_eq!(ids(&out.records), vec![1, 3]);
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_abort_inside_next_stops_outer_continuation() {
    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    let wrapper = Hook::new("wrapper", Vec::new(), |ctx, _| {
        ctx.next();
        assert!(ctx.is_aborted());
        Ok(())
    });
    let abort = Hook::new("abort", Vec::new(), |ctx, _| {
        ctx.abort();
        Ok(())
    });
    let after = Hook::new("after", Vec::new(), move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let hooks = registry(vec![wrapper, abort, after]);
    let chain = HookChain::parse(&["wrapper()", "abort()", "after()"], &hooks).unwrap();

    let out = chain.pass_through(batch(1));
    assert!(out.error.is_none());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_error_halts_pass_and_keeps_survivors() {
    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    let fail = Hook::new("fail", Vec::new(), |ctx, _| {
        Err(TransformError::step_failed(
            ctx.step_name().unwrap_or("?"),
            "boom",
        ))
    });
    let after = Hook::new("after", Vec::new(), move |_, _| {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let hooks = registry(vec![drop_multiples(), fail, after]);
    let chain =
        HookChain::parse(&["dropMultiples(2)", "fail()", "after()"], &hooks).unwrap();

    let out = chain.pass_through(batch(4));
    assert!(matches!(
        out.error,
        Some(TransformError::StepFailed { ref hook, .. }) if hook == "fail"
    ));
    assert_eq!(ids(&out.records), vec![1, 3]);
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    assert!(chain.try_pass_through(batch(4)).is_err());
}

#[test]
fn test_first_error_wins() {
    let wrapper = Hook::new("wrapper", Vec::new(), |ctx, _| {
        ctx.next();
        assert!(ctx.has_failed());
        Err(TransformError::step_failed("wrapper", "second"))
    });
    let fail = Hook::new("fail", Vec::new(), |_, _| {
        Err(TransformError::step_failed("fail", "first"))
    });
    let hooks = registry(vec![wrapper, fail]);
    let chain = HookChain::parse(&["wrapper()", "fail()"], &hooks).unwrap();

    let err = chain.try_pass_through(batch(1)).unwrap_err();
    assert!(err.to_string().contains("first"));
}

#[test]
fn test_retry_sees_full_original_batch() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&attempts);
    let flaky = Hook::new("flaky", Vec::new(), move |ctx, _| {
        let attempt = a.fetch_add(1, Ordering::SeqCst);
        assert_eq!(ctx.remaining(), ctx.len());
        ctx.for_each(|r| {
            let id = r.field("id").and_then(Value::as_i64).unwrap_or_default();
            Visit::new(id == 0, false)
        });
        if attempt == 0 {
            return Err(TransformError::step_failed("flaky", "transient"));
        }
        Ok(())
    });
    let chain = HookChain::parse(&["flaky()"], registry(vec![flaky])).unwrap();

    let original = batch(3);
    let first = chain.pass_through(original.clone());
    assert!(first.error.is_some());

    let second = chain.pass_through(original.clone());
    assert!(second.error.is_none());
    assert_eq!(ids(&second.records), vec![1, 2]);
    assert_eq!(original.len(), 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_step_name_and_position() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let probe = Hook::new("probe", Vec::new(), move |ctx, _| {
        s.lock()
            .unwrap()
            .push((ctx.step_name().map(str::to_string), ctx.position()));
        Ok(())
    });
    let hooks = registry(vec![probe]);
    let chain = HookChain::parse(&["probe()", "probe()"], &hooks).unwrap();
    chain.pass_through(batch(1));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(Some("probe".to_string()), 0), (Some("probe".to_string()), 1)]
    );
}

#[test]
fn test_display() {
    let hooks = registry(vec![drop_multiples(), Hook::new("noop", Vec::new(), |_, _| Ok(()))]);
    let chain = HookChain::parse(&["dropMultiples( 3 )", "noop()"], &hooks).unwrap();
    assert_eq!(chain.to_string(), "dropMultiples(3) -> noop()");
}

#[test]
fn test_builtin_hooks_resolve() {
    let hooks = registry(crate::builtin_hooks());
    let chain = HookChain::parse(
        &["noop()", "delay(1ms)", "dataFilter(-,-,id,=,1)"],
        &hooks,
    )
    .unwrap();
    let out = chain.pass_through(batch(3));
    assert_eq!(ids(&out.records), vec![0, 2]);
}
