//! Generator source - synthetic inserts on an interval
//!
//! Emits one `Insert` event per tick into `database`.`table`, each carrying a
//! monotonically increasing `sequence` in its metadata. Checkpoints remember
//! the last delivered sequence; a restart resumes right after it.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `interval_ms` | int | `1000` | Time between events |
//! | `database` | string | `"sluice"` | Database name on every event |
//! | `table` | string | `"generated"` | Table name on every event |
//! | `limit` | int | `0` | Stop producing after this many events (0 = never) |
//!
//! ```toml
//! [pipelines.source]
//! driver = "generator"
//! options = { interval_ms = 250, table = "orders" }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sluice_config::SourceConfig;
use sluice_protocol::{
    ChangeEvent, Column, ColumnType, DatabaseRef, EventKind, TableSchema, Value,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{EventStream, Source, SourceError, SourceResult};


/// Driver name
pub const NAME: &str = "generator";

/// Metadata key carrying the event sequence number
pub const SEQUENCE_KEY: &str = "sequence";

const DEFAULT_INTERVAL_MS: u64 = 1000;
const DEFAULT_DATABASE: &str = "sluice";
const DEFAULT_TABLE: &str = "generated";
const STREAM_CAPACITY: usize = 64;

/// Settings applied by `init`
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub interval: Duration,
    pub database: String,
    pub table: String,
    pub limit: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            database: DEFAULT_DATABASE.into(),
            table: DEFAULT_TABLE.into(),
            limit: 0,
        }
    }
}

impl TryFrom<&SourceConfig> for GeneratorSettings {
    type Error = SourceError;

    fn try_from(config: &SourceConfig) -> Result<Self, Self::Error> {
        let mut settings = Self::default();
        let options = &config.options;

        if let Some(ms) = options.get_int("interval_ms") {
            if ms <= 0 {
                return Err(SourceError::invalid_option(
                    NAME,
                    "interval_ms",
                    format!("must be positive, got {ms}"),
                ));
            }
            settings.interval = Duration::from_millis(ms as u64);
        } else if options.contains("interval_ms") {
            return Err(SourceError::invalid_option(NAME, "interval_ms", "must be an integer"));
        }

        if let Some(db) = options.get_str("database") {
            settings.database = db.to_string();
        }
        if let Some(table) = options.get_str("table") {
            settings.table = table.to_string();
        }

        if let Some(limit) = options.get_int("limit") {
            settings.limit = u64::try_from(limit).map_err(|_| {
                SourceError::invalid_option(NAME, "limit", format!("must be >= 0, got {limit}"))
            })?;
        }

        Ok(settings)
    }
}

/// Source emitting synthetic insert events
#[derive(Debug, Default)]
pub struct GeneratorSource {
    settings: GeneratorSettings,
    /// Last checkpointed sequence (0 = none yet)
    committed: Arc<AtomicU64>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl GeneratorSource {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Last checkpointed sequence, 0 if nothing was checkpointed
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }

    fn schema(&self) -> TableSchema {
        TableSchema::new(&self.settings.table)
            .with_column(Column::new("id", ColumnType::Number))
            .with_column(Column::new("label", ColumnType::String))
            .with_column(Column::new("created_at", ColumnType::Datetime))
    }
}

fn make_event(database: &DatabaseRef, table: &TableSchema, sequence: u64) -> ChangeEvent {
    let id = i64::try_from(sequence).unwrap_or(i64::MAX);
    ChangeEvent::new(EventKind::Insert, database.clone(), table.clone())
        .with_field("id", id)
        .with_field("label", format!("row-{sequence}"))
        .with_field("created_at", Value::Timestamp(Utc::now()))
        .with_metadata(SEQUENCE_KEY, json!(sequence))
}

/// Read the sequence number stored in an event's metadata
pub fn sequence_of(event: &ChangeEvent) -> Option<u64> {
    event.metadata.get(SEQUENCE_KEY).and_then(|v| v.as_u64())
}

async fn produce(
    tx: mpsc::Sender<ChangeEvent>,
    database: DatabaseRef,
    table: TableSchema,
    first: u64,
    interval: Duration,
    limit: u64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut sequence = first;

    loop {
        if limit > 0 && sequence >= first + limit {
            // keep the stream open until stopped
            cancel.cancelled().await;
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let event = make_event(&database, &table, sequence);
        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = tx.send(event) => {
                if sent.is_err() {
                    debug!(source = NAME, "event stream receiver dropped");
                    return;
                }
            }
        }
        sequence += 1;
    }
}

#[async_trait]
impl Source for GeneratorSource {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self, config: &SourceConfig) -> SourceResult<()> {
        self.settings = GeneratorSettings::try_from(config)?;
        Ok(())
    }

    async fn start(&mut self) -> SourceResult<EventStream> {
        if self.task.is_some() {
            return Err(SourceError::AlreadyStarted(NAME.into()));
        }

        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        let cancel = CancellationToken::new();
        let first = self.committed() + 1;

        info!(
            source = NAME,
            database = %self.settings.database,
            table = %self.settings.table,
            interval_ms = self.settings.interval.as_millis() as u64,
            first_sequence = first,
            "generator started"
        );

        self.task = Some(tokio::spawn(produce(
            tx,
            DatabaseRef::new(&self.settings.database),
            self.schema(),
            first,
            self.settings.interval,
            self.settings.limit,
            cancel.clone(),
        )));
        self.cancel = Some(cancel);
        Ok(rx)
    }

    async fn checkpoint(&mut self, event: &ChangeEvent) -> SourceResult<()> {
        let Some(sequence) = sequence_of(event) else {
            // nothing to resume from
            return Ok(());
        };
        self.committed.fetch_max(sequence, Ordering::SeqCst);
        debug!(source = NAME, sequence, "checkpoint saved");
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(source = NAME, error = %e, "generator task failed");
            }
            info!(source = NAME, committed = self.committed(), "generator stopped");
        }
    }
}
