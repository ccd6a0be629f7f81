//! Tests for the memory destination

use super::*;
use sluice_protocol::{DatabaseRef, EventKind, TableSchema};

fn record(id: i64) -> ChangeEvent {
    ChangeEvent::new(EventKind::Insert, DatabaseRef::new("db"), TableSchema::new("t"))
        .with_field("id", id)
}

#[tokio::test]
async fn test_records_batches_in_order() {
    let handle = MemoryDestinationHandle::new();
    let mut dest = handle.destination();

    dest.start().await.unwrap();
    dest.write_batch(&[record(1), record(2)]).await.unwrap();
    dest.write_batch(&[record(3)]).await.unwrap();

    assert_eq!(handle.writes(), 2);
    assert_eq!(handle.batches()[0].len(), 2);
    let ids: Vec<_> = handle
        .records()
        .iter()
        .filter_map(|r| r.field("id").and_then(|v| v.as_i64()))
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_write_before_start_is_rejected() {
    let mut dest = MemoryDestination::default();
    let err = dest.write_batch(&[record(1)]).await.unwrap_err();
    assert!(matches!(err, DestinationError::NotStarted(_)));
}

#[tokio::test]
async fn test_fail_next_writes() {
    let handle = MemoryDestinationHandle::new();
    let mut dest = handle.destination();
    dest.start().await.unwrap();

    handle.fail_next_writes(2);
    assert!(dest.write_batch(&[record(1)]).await.is_err());
    assert!(dest.write_batch(&[record(1)]).await.is_err());
    dest.write_batch(&[record(1)]).await.unwrap();

    assert_eq!(handle.write_attempts(), 3);
    assert_eq!(handle.writes(), 1);
}

#[tokio::test]
async fn test_fail_always() {
    let handle = MemoryDestinationHandle::new();
    let mut dest = handle.destination();
    dest.start().await.unwrap();

    handle.fail_always(true);
    for _ in 0..5 {
        assert!(dest.write_batch(&[record(1)]).await.is_err());
    }
    handle.fail_always(false);
    dest.write_batch(&[record(1)]).await.unwrap();
    assert_eq!(handle.writes(), 1);
}

#[tokio::test]
async fn test_fail_start() {
    let handle = MemoryDestinationHandle::new();
    handle.fail_start(true);
    let mut dest = handle.destination();

    assert!(matches!(
        dest.start().await,
        Err(DestinationError::Start { .. })
    ));
    dest.stop().await;
    assert_eq!(handle.starts(), 0);
    assert_eq!(handle.stops(), 0);
}

#[tokio::test]
async fn test_factory_instances_share_handle() {
    let handle = MemoryDestinationHandle::new();
    let factory = handle.factory();

    let mut a = factory();
    let mut b = factory();
    a.init(&DestinationConfig::new(NAME).with_url("mem://a")).unwrap();
    b.init(&DestinationConfig::new(NAME)).unwrap();
    a.start().await.unwrap();
    b.start().await.unwrap();
    a.write_batch(&[record(1)]).await.unwrap();
    b.write_batch(&[record(2)]).await.unwrap();
    a.stop().await;
    b.stop().await;

    assert_eq!(handle.writes(), 2);
    assert_eq!(handle.configs().len(), 2);
    assert_eq!(handle.starts(), 2);
    assert_eq!(handle.stops(), 2);
}

#[tokio::test]
async fn test_wait_for_batches() {
    let handle = MemoryDestinationHandle::new();
    let mut dest = handle.destination();
    dest.start().await.unwrap();

    let waiter = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.wait_for_batches(2).await })
    };

    dest.write_batch(&[record(1)]).await.unwrap();
    tokio::task::yield_now().await;
    dest.write_batch(&[record(2)]).await.unwrap();

    waiter.await.unwrap();
    assert_eq!(handle.writes(), 2);
}
