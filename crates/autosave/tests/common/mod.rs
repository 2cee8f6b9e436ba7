//! Common utilities for autosave integration tests

use async_trait::async_trait;
use autosave::{AutosaveConfig, AutosaveCoordinator, PersistenceAdapter};
use axiom_core::{EditableRecord, FieldMap, FieldSchema, RecordId, RemoteError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One write observed by the adapter
#[derive(Debug, Clone)]
pub struct Flush {
    /// Time since the adapter was created
    pub at: Duration,
    pub fields: FieldMap,
}

/// Adapter that records every write and can be told to fail
pub struct RecordingAdapter {
    started: Instant,
    latency: Duration,
    flushes: Mutex<Vec<Flush>>,
    failure: Mutex<Option<RemoteError>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingAdapter {
    pub fn new() -> Arc<Self> {
        Self::with_latency(Duration::ZERO)
    }

    /// Every write takes `latency` to resolve
    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            latency,
            flushes: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Fail every write from now on (`None` to succeed again)
    pub fn fail_with(&self, err: Option<RemoteError>) {
        *self.failure.lock() = err;
    }

    pub fn flushes(&self) -> Vec<Flush> {
        self.flushes.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceAdapter for RecordingAdapter {
    async fn flush(&self, _record: &RecordId, fields: &FieldMap) -> Result<(), RemoteError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.flushes.lock().push(Flush {
            at: self.started.elapsed(),
            fields: fields.clone(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn project_baseline(json: serde_json::Value) -> EditableRecord {
    FieldSchema::project().record_from_row(&json)
}

/// Loaded project coordinator with the given quiet period
pub fn project_autosave(
    adapter: Arc<RecordingAdapter>,
    quiet_ms: u64,
    baseline: serde_json::Value,
) -> AutosaveCoordinator {
    let config = AutosaveConfig {
        quiet_period: Duration::from_millis(quiet_ms),
        saved_display: Some(Duration::from_millis(2000)),
    };
    let autosave = AutosaveCoordinator::new(
        RecordId::new("project-1"),
        FieldSchema::project(),
        adapter,
        config,
    );
    autosave.load(project_baseline(baseline));
    autosave
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
