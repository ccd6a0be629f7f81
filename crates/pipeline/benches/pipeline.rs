//! Pipeline benchmark suite
//!
//! Benchmarks for batch windows, fan-out delivery and hook chain passes.
//!
//! Run with: `cargo bench -p sluice-pipeline`

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sluice_destinations::NullDestination;
use sluice_pipeline::{BatchWindow, DestinationSlot, FanOutWriter, PipelineMetrics, RetryPolicy};
use sluice_protocol::{ChangeEvent, DatabaseRef, EventKind, TableSchema};
use sluice_registry::Registry;
use sluice_transform::HookChain;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Create a batch of order events with ids `0..count`
fn create_test_events(count: usize) -> Vec<ChangeEvent> {
    (0..count as i64)
        .map(|i| {
            ChangeEvent::new(
                EventKind::Insert,
                DatabaseRef::new("shop"),
                TableSchema::new("orders"),
            )
            .with_field("id", i)
            .with_field("amount", i % 50)
            .with_field("note", format!("order {i} with some additional data"))
        })
        .collect()
}

/// Benchmark closing a size-bounded window, cloning per destination
fn bench_window_collect(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("window_collect");

    for destinations in [1, 3, 5] {
        group.throughput(Throughput::Elements(100));
        group.bench_with_input(
            BenchmarkId::from_parameter(destinations),
            &destinations,
            |b, &destinations| {
                let window = BatchWindow::new(100, Some(Duration::from_secs(1)), destinations);
                let cancel = CancellationToken::new();
                let events = create_test_events(100);

                b.to_async(&rt).iter(|| {
                    let events = events.clone();
                    let cancel = cancel.clone();
                    async move {
                        let (tx, mut rx) = mpsc::channel(events.len());
                        for event in events {
                            tx.send(event).await.unwrap();
                        }
                        black_box(window.collect(&mut rx, &cancel).await)
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark delivering one window to several null destinations
fn bench_fanout(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("fanout");

    for destinations in [1, 3, 10] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(destinations),
            &destinations,
            |b, &destinations| {
                let writer = FanOutWriter::new(
                    Arc::from("bench"),
                    RetryPolicy::default(),
                    Arc::new(PipelineMetrics::new()),
                );
                let cancel = CancellationToken::new();
                let batch = create_test_events(100);

                b.to_async(&rt).iter(|| {
                    let writer = writer.clone();
                    let cancel = cancel.clone();
                    let batches = vec![batch.clone(); destinations];
                    async move {
                        let mut slots = Vec::with_capacity(destinations);
                        for i in 0..destinations {
                            let mut null = NullDestination::new();
                            sluice_destinations::Destination::start(&mut null).await.unwrap();
                            let null = Box::new(null);
                            slots.push(DestinationSlot::new(i, "null", null, HookChain::empty()));
                        }
                        black_box(writer.deliver(slots, batches, &cancel).await)
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark one hook chain pass over a batch
fn bench_chain_pass(c: &mut Criterion) {
    let registry = Registry::with_builtins();

    let mut group = c.benchmark_group("chain_pass");

    let chains = [
        ("empty", Vec::<String>::new()),
        ("noop", vec!["noop()".to_string()]),
        ("data_filter", vec!["dataFilter(-,orders,amount,<,10)".to_string()]),
        (
            "filter_x3",
            vec![
                "dataFilter(shop,orders,amount,<,10)".to_string(),
                "dataFilter(-,orders,amount,>,40)".to_string(),
                "dataFilter(-,-,note,=,order 7)".to_string(),
            ],
        ),
    ];

    for (name, calls) in chains {
        let chain = HookChain::parse(&calls, &registry).unwrap();
        for batch_size in [10, 100, 1000] {
            let batch = create_test_events(batch_size);
            group.throughput(Throughput::Elements(batch_size as u64));
            group.bench_with_input(BenchmarkId::new(name, batch_size), &batch, |b, batch| {
                b.iter(|| black_box(chain.pass_through(batch.clone())));
            });
        }
    }

    group.finish();
}

/// Benchmark metrics recording
fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    group.bench_function("record_written", |b| {
        let metrics = PipelineMetrics::new();
        b.iter(|| {
            metrics.record_written(100);
            black_box(&metrics)
        });
    });

    group.bench_function("snapshot", |b| {
        let metrics = PipelineMetrics::new();
        metrics.record_collected(1000);
        metrics.record_delivered();
        metrics.record_written(1000);
        metrics.record_checkpoint();

        b.iter(|| black_box(metrics.snapshot()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_window_collect,
    bench_fanout,
    bench_chain_pass,
    bench_metrics,
);

criterion_main!(benches);
