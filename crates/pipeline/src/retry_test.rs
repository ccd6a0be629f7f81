//! Tests for the retry policy

use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;

fn policy() -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(100), Duration::from_millis(350), 2.0)
}

#[derive(Debug)]
struct Flaky(u32);

impl fmt::Display for Flaky {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flaky attempt {}", self.0)
    }
}

impl StdError for Flaky {}

#[test]
fn test_defaults_follow_config() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.initial_interval(), Duration::from_millis(1500));
    assert_eq!(policy.max_interval(), Duration::from_millis(10_000));
    assert_eq!(policy.multiplier(), 2.0);
}

#[test]
fn test_new_repairs_inconsistent_values() {
    let policy = RetryPolicy::new(Duration::from_secs(2), Duration::from_secs(1), 0.5);
    assert_eq!(policy.max_interval(), Duration::from_secs(2));
    assert_eq!(policy.multiplier(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_first_success_does_not_wait() {
    let cancel = CancellationToken::new();
    let start = Instant::now();

    let value = policy()
        .run("op", &cancel, || async { Ok::<_, Flaky>(7) })
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_grows_and_caps() {
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    let result = policy()
        .run("op", &cancel, || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 5 { Err(Flaky(n)) } else { Ok(n) }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 5);
    // 100 + 200 + 350 (capped) + 350
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_first_attempt() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let calls = AtomicU32::new(0);

    let err = policy()
        .run("write", &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Flaky>(()) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(err.operation(), "write");
    assert_eq!(err.attempts(), 0);
    assert!(err.last_error().is_none());
    assert_eq!(err.to_string(), "write cancelled after 0 attempt(s)");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_wait() {
    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            cancel.cancel();
        })
    };
    let start = Instant::now();

    let err = RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(10), 2.0)
        .run("checkpoint", &cancel, || async { Err::<(), _>(Flaky(1)) })
        .await
        .unwrap_err();

    canceller.await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(30));
    assert_eq!(err.attempts(), 1);
    assert_eq!(err.last_error().unwrap().to_string(), "flaky attempt 1");
    assert!(err.source().is_some());
    assert!(err.to_string().ends_with("last error: flaky attempt 1"));
}

#[tokio::test(start_paused = true)]
async fn test_manual_loop_borrows_state() {
    let cancel = CancellationToken::new();
    let mut log: Vec<u32> = Vec::new();

    let mut retry = policy().start("append", &cancel);
    loop {
        let attempt = retry.begin().unwrap();
        log.push(attempt);
        if attempt == 3 {
            retry.succeeded();
            break;
        }
        retry.failed(Flaky(attempt)).await;
    }

    assert_eq!(log, vec![1, 2, 3]);
    assert_eq!(retry.attempts(), 3);
}
