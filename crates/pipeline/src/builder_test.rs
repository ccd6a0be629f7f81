//! Tests for the pipeline builder

use super::*;
use sluice_config::{DestinationConfig, DriverOptions, RetryConfig, SourceConfig};
use sluice_destinations::{DestinationError, MemoryDestinationHandle};
use sluice_registry::{RegistryError, Role};
use sluice_sources::{MemorySourceHandle, SourceError};
use sluice_transform::TransformError;

fn registry() -> Registry {
    let registry = Registry::with_builtins();
    registry
        .register_source("memory", MemorySourceHandle::new().factory())
        .unwrap();
    registry
        .register_destination("memory", MemoryDestinationHandle::new().factory())
        .unwrap();
    registry
}

fn config() -> PipelineConfig {
    PipelineConfig::new("orders", SourceConfig::new("memory"))
        .with_destination(DestinationConfig::new("null").with_hook("noop()"))
        .with_destination(
            DestinationConfig::new("stdout").with_hook("dataFilter(-,orders,amount,<,10)"),
        )
}

#[test]
fn test_from_config_binds_every_destination() {
    let pipeline = PipelineBuilder::from_config(
        &config()
            .with_max_batch_size(100)
            .with_max_wait_time_ms(250)
            .with_retry(RetryConfig {
                initial_interval_ms: 10,
                max_interval_ms: 40,
                multiplier: 3.0,
            }),
        &registry(),
    )
    .unwrap()
    .build()
    .unwrap();

    assert_eq!(pipeline.name(), "orders");
    assert_eq!(pipeline.state(), crate::PipelineState::Stopped);

    let settings = pipeline.settings();
    assert_eq!(settings.window.max_batch_size(), 100);
    assert_eq!(settings.window.max_wait(), Some(Duration::from_millis(250)));
    assert_eq!(settings.window.destinations(), 2);
    assert_eq!(settings.retry.initial_interval(), Duration::from_millis(10));
    assert_eq!(settings.retry.max_interval(), Duration::from_millis(40));
    assert_eq!(settings.retry.multiplier(), 3.0);
}

#[test]
fn test_zero_tuning_falls_back_to_defaults() {
    let pipeline = PipelineBuilder::from_config(
        &config().with_max_batch_size(0).with_retry(RetryConfig {
            initial_interval_ms: 0,
            max_interval_ms: 0,
            multiplier: 0.0,
        }),
        &registry(),
    )
    .unwrap()
    .build()
    .unwrap();

    let settings = pipeline.settings();
    assert_eq!(settings.window.max_batch_size(), 1);
    assert_eq!(settings.window.max_wait(), None);
    assert_eq!(settings.retry, RetryPolicy::default());
}

#[test]
fn test_unknown_driver() {
    let config = PipelineConfig::new("p", SourceConfig::new("mysql"))
        .with_destination(DestinationConfig::new("null"));

    let err = PipelineBuilder::from_config(&config, &registry()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Registry(RegistryError::NotFound { role: Role::Source, .. })
    ));
    assert!(err.is_build_error());
}

#[test]
fn test_driver_used_in_wrong_role() {
    let config = PipelineConfig::new("p", SourceConfig::new("stdout"))
        .with_destination(DestinationConfig::new("null"));

    let err = PipelineBuilder::from_config(&config, &registry()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Registry(RegistryError::TypeMismatch { .. })
    ));
}

#[test]
fn test_hook_arity_mismatch_names_destination() {
    let config = PipelineConfig::new("p", SourceConfig::new("memory"))
        .with_destination(DestinationConfig::new("null"))
        .with_destination(DestinationConfig::new("null").with_hook("dataFilter(db1,tbl1,amount)"));

    match PipelineBuilder::from_config(&config, &registry()).unwrap_err() {
        PipelineError::Chain { index, driver, source } => {
            assert_eq!(index, 1);
            assert_eq!(driver, "null");
            assert!(matches!(source, TransformError::ArgCount { expected: 5, actual: 3, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_hook_argument() {
    let config = PipelineConfig::new("p", SourceConfig::new("memory"))
        .with_destination(DestinationConfig::new("null").with_hook("delay(soon)"));

    let err = PipelineBuilder::from_config(&config, &registry()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Chain { source: TransformError::InvalidArgument { .. }, .. }
    ));
}

#[test]
fn test_driver_options_are_validated() {
    let config = PipelineConfig::new(
        "p",
        SourceConfig::new("generator")
            .with_options(DriverOptions::new().with("interval_ms", 0i64)),
    )
    .with_destination(DestinationConfig::new("null"));
    let err = PipelineBuilder::from_config(&config, &registry()).unwrap_err();
    assert!(matches!(err, PipelineError::Source(SourceError::InvalidOption { .. })));

    let config = PipelineConfig::new("p", SourceConfig::new("memory")).with_destination(
        DestinationConfig::new("stdout")
            .with_options(DriverOptions::new().with("max_records", "all")),
    );
    let err = PipelineBuilder::from_config(&config, &registry()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Destination { index: 0, source: DestinationError::InvalidOption { .. }, .. }
    ));
}

#[test]
fn test_config_without_destinations_is_rejected() {
    let config = PipelineConfig::new("p", SourceConfig::new("memory"));
    let err = PipelineBuilder::from_config(&config, &registry()).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_build_requires_source_and_destination() {
    let err = PipelineBuilder::new("p").build().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::MissingField { field: "source", .. })
    ));

    let err = PipelineBuilder::new("p")
        .source(Box::new(MemorySourceHandle::new().source()))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::MissingField { field: "destinations", .. })
    ));
}
