//! The autosave coordinator
//!
//! Accepts field edits from the presentation layer, updates the local record
//! immediately, and persists each field once its quiet period has elapsed.
//! Writes for one record are serialized: a batch that becomes due while
//! another write is in flight waits for it and then carries the latest
//! values.
//!
//! All methods that arm timers must be called from within a Tokio runtime.

use crate::adapter::PersistenceAdapter;
use crate::coalesce::Coalescer;
use crate::debounce::TimerTable;
use crate::reconcile::reconcile;
use crate::status::{AutosaveState, AutosaveStatus, StatusReporter};
use crate::AutosaveConfig;
use axiom_core::{
    EditableRecord, FieldMap, FieldSchema, FieldValue, RecordId, RemoteError, SchemaViolation,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

/// Why an edit was ignored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditRejection {
    /// The baseline has not been loaded yet
    #[error("record is still loading")]
    NotLoaded,

    /// The field or value does not fit the record's schema
    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

/// Result of [`AutosaveCoordinator::on_field_edit`]
///
/// A rejected edit is a no-op, not a failure: the input comes from UI
/// controls that already constrain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Accepted,
    Rejected(EditRejection),
}

impl EditOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Local copy of the record plus write bookkeeping
struct Session {
    /// Bumped by every `load`; write results from an older baseline are dropped
    epoch: u64,
    record: EditableRecord,
    coalescer: Coalescer,
}

struct State {
    /// `None` until the baseline is loaded
    session: Option<Session>,
    /// Baselines loaded so far
    loads: u64,
    timers: TimerTable,
    /// A drain loop is running (at most one per record)
    flushing: bool,
    /// Accepted edits so far; lets a delayed Saved -> Idle notice newer edits
    edits: u64,
    last_error: Option<RemoteError>,
}

struct Shared {
    record_id: RecordId,
    schema: FieldSchema,
    config: AutosaveConfig,
    adapter: Arc<dyn PersistenceAdapter>,
    state: Mutex<State>,
    status: StatusReporter,
    /// Woken whenever the coordinator may have become quiet
    quiet: Notify,
}

/// Debounced autosave for one record
pub struct AutosaveCoordinator {
    shared: Arc<Shared>,
}

impl AutosaveCoordinator {
    /// Create a coordinator for `record_id`
    ///
    /// Status starts as Saving ("Autosave is starting") until [`load`](Self::load)
    /// installs the baseline.
    pub fn new(
        record_id: RecordId,
        schema: FieldSchema,
        adapter: Arc<dyn PersistenceAdapter>,
        config: AutosaveConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                record_id,
                schema,
                config,
                adapter,
                state: Mutex::new(State {
                    session: None,
                    loads: 0,
                    timers: TimerTable::new(),
                    flushing: false,
                    edits: 0,
                    last_error: None,
                }),
                status: StatusReporter::new(AutosaveStatus::starting()),
                quiet: Notify::new(),
            }),
        }
    }

    /// Install the baseline fetched from the remote store
    ///
    /// Fields outside the schema are dropped. Calling this again replaces the
    /// record and discards any edit still waiting for its quiet period. A
    /// write already in flight still completes, but its outcome is not
    /// applied to the new baseline.
    pub fn load(&self, baseline: EditableRecord) {
        let shared = &self.shared;
        let record: EditableRecord = baseline
            .iter()
            .filter(|(field, _)| shared.schema.kind(field).is_some())
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        {
            let mut guard = shared.state.lock();
            let st = &mut *guard;
            let discarded = st.timers.cancel_all();
            if !discarded.is_empty() {
                warn!(record = %shared.record_id, fields = ?discarded, "Reload discarded unsaved edits");
            }
            st.loads += 1;
            st.session = Some(Session {
                epoch: st.loads,
                coalescer: Coalescer::new(&record),
                record,
            });
            st.last_error = None;
            shared.status.set(AutosaveStatus::idle());
        }

        debug!(record = %shared.record_id, "Autosave baseline loaded");
        shared.quiet.notify_waiters();
    }

    /// Accept an edit from the presentation layer
    ///
    /// The local value changes immediately, the field's quiet period
    /// (re)starts and the status switches to Saving before this returns.
    pub fn on_field_edit(&self, field: &str, value: impl Into<FieldValue>) -> EditOutcome {
        let value = value.into();
        let shared = &self.shared;
        let mut guard = shared.state.lock();
        let st = &mut *guard;

        let Some(session) = st.session.as_mut() else {
            warn!(record = %shared.record_id, field, "Ignoring edit before baseline loaded");
            return EditOutcome::Rejected(EditRejection::NotLoaded);
        };

        if let Err(violation) = shared.schema.check(field, &value) {
            warn!(record = %shared.record_id, field, %violation, "Ignoring edit");
            return EditOutcome::Rejected(violation.into());
        }

        session.record.set(field, value);
        session.coalescer.unready(field);
        st.edits += 1;

        let generation = st.timers.next_generation();
        let timer = {
            let shared = Arc::clone(shared);
            let field = field.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(shared.config.quiet_period).await;
                shared.on_quiet_period(field, generation).await;
            })
        };
        let restarted = st.timers.arm(field, generation, timer.abort_handle());
        debug!(record = %shared.record_id, field, restarted, "Edit accepted");

        shared.status.set(AutosaveStatus::saving());
        EditOutcome::Accepted
    }

    /// Flush every pending field now instead of waiting for quiet periods
    ///
    /// Intended for page teardown. Waits until nothing is pending.
    pub async fn flush_now(&self) {
        let start = {
            let mut guard = self.shared.state.lock();
            let st = &mut *guard;
            let due = st.timers.cancel_all();
            match st.session.as_mut() {
                Some(session) => {
                    for field in &due {
                        session.coalescer.mark_ready(field);
                    }
                    let start = session.coalescer.has_ready() && !st.flushing;
                    if start {
                        st.flushing = true;
                    }
                    start
                }
                None => false,
            }
        };

        if start {
            self.shared.drain().await;
        }
        self.settled().await;
    }

    /// Manually retry every field whose last write failed
    ///
    /// Returns the number of fields queued. Failed fields are never retried
    /// automatically; this and a new edit are the only ways to re-send them.
    pub async fn retry(&self) -> usize {
        let (queued, start) = {
            let mut guard = self.shared.state.lock();
            let st = &mut *guard;
            let Some(session) = st.session.as_mut() else {
                return 0;
            };
            let timers = &st.timers;
            let queued = session
                .coalescer
                .requeue_failed(&session.record, |field| timers.is_armed(field));
            if queued == 0 {
                if !session.coalescer.has_failures() && st.timers.is_empty() && !st.flushing {
                    st.last_error = None;
                    if self.shared.status.state() == AutosaveState::Error {
                        self.shared.status.set(AutosaveStatus::idle());
                    }
                }
                return 0;
            }

            info!(record = %self.shared.record_id, fields = queued, "Retrying failed fields");
            self.shared.status.set(AutosaveStatus::saving());
            let start = !st.flushing;
            st.flushing = true;
            (queued, start)
        };

        if start {
            self.shared.drain().await;
        }
        queued
    }

    /// Merge a fresh server snapshot into the local record
    ///
    /// Returns the fields whose local value changed.
    pub fn reconcile(&self, server: &EditableRecord) -> Vec<String> {
        let mut guard = self.shared.state.lock();
        let st = &mut *guard;
        let Some(session) = st.session.as_mut() else {
            return Vec::new();
        };

        let dirty: BTreeSet<String> = session
            .record
            .iter()
            .map(|(field, _)| field)
            .filter(|field| {
                st.timers.is_armed(field)
                    || session.coalescer.is_pending(field)
                    || session.coalescer.is_failed(field)
            })
            .cloned()
            .collect();

        let changed = reconcile(
            &mut session.record,
            &mut session.coalescer,
            server,
            |field| dirty.contains(field),
        );

        if !session.coalescer.has_failures() && st.timers.is_empty() && !st.flushing {
            st.last_error = None;
            if self.shared.status.state() == AutosaveState::Error {
                self.shared.status.set(AutosaveStatus::idle());
            }
        }
        changed
    }

    /// Wait until no timer is armed and no write is queued or in flight
    pub async fn settled(&self) {
        loop {
            let notified = self.shared.quiet.notified();
            if self.shared.is_quiet() {
                return;
            }
            notified.await;
        }
    }

    /// Current status
    pub fn status(&self) -> AutosaveStatus {
        self.shared.status.get()
    }

    /// Receive every status change
    pub fn subscribe(&self) -> watch::Receiver<AutosaveStatus> {
        self.shared.status.subscribe()
    }

    /// Error behind the current Error status
    pub fn last_error(&self) -> Option<RemoteError> {
        self.shared.state.lock().last_error.clone()
    }

    /// Optimistic local copy of the record
    pub fn record(&self) -> Option<EditableRecord> {
        self.shared
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.record.clone())
    }

    /// Local value of one field
    pub fn value(&self, field: &str) -> Option<FieldValue> {
        self.shared
            .state
            .lock()
            .session
            .as_ref()
            .and_then(|s| s.record.get(field).cloned())
    }

    /// True while `field` has an unsaved edit (waiting, queued or in flight)
    pub fn is_pending(&self, field: &str) -> bool {
        let st = self.shared.state.lock();
        st.timers.is_armed(field)
            || st
                .session
                .as_ref()
                .is_some_and(|s| s.coalescer.is_pending(field))
    }

    pub fn is_loaded(&self) -> bool {
        self.shared.state.lock().session.is_some()
    }

    pub fn record_id(&self) -> &RecordId {
        &self.shared.record_id
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.shared.schema
    }
}

impl Drop for AutosaveCoordinator {
    fn drop(&mut self) {
        let discarded = self.shared.state.lock().timers.cancel_all();
        if !discarded.is_empty() {
            warn!(record = %self.shared.record_id, fields = ?discarded, "Dropping unsaved edits");
        }
    }
}

impl Shared {
    /// A field's timer expired
    async fn on_quiet_period(self: Arc<Self>, field: String, generation: u64) {
        let start = {
            let mut guard = self.state.lock();
            let st = &mut *guard;
            if !st.timers.fire(&field, generation) {
                return;
            }
            let Some(session) = st.session.as_mut() else {
                return;
            };
            session.coalescer.mark_ready(&field);
            debug!(record = %self.record_id, field = %field, queued = st.flushing, "Quiet period elapsed");

            let start = !st.flushing;
            st.flushing = true;
            start
        };

        if start {
            self.drain().await;
        }
    }

    /// Write ready batches one at a time until nothing is ready
    ///
    /// Only one drain runs per record; callers set `flushing` before entering.
    async fn drain(self: &Arc<Self>) {
        loop {
            let (epoch, batch) = {
                let mut guard = self.state.lock();
                let st = &mut *guard;
                let (epoch, batch) = match st.session.as_mut() {
                    Some(session) => (
                        session.epoch,
                        session.coalescer.take_batch(&session.record, &self.schema),
                    ),
                    None => (0, FieldMap::new()),
                };

                if batch.is_empty() {
                    st.flushing = false;
                    self.settle(st);
                    drop(guard);
                    self.quiet.notify_waiters();
                    return;
                }

                self.status.set(AutosaveStatus::saving());
                (epoch, batch)
            };

            debug!(record = %self.record_id, fields = ?batch.keys().collect::<Vec<_>>(), "Flushing");
            let result = self.adapter.flush(&self.record_id, &batch).await;

            let mut guard = self.state.lock();
            let st = &mut *guard;
            let Some(session) = st.session.as_mut().filter(|s| s.epoch == epoch) else {
                debug!(record = %self.record_id, ok = result.is_ok(), "Write finished after reload, result dropped");
                continue;
            };
            match result {
                Ok(()) => {
                    session.coalescer.commit(&batch);
                    info!(record = %self.record_id, fields = batch.len(), "Changes saved");
                }
                Err(err) => {
                    session.coalescer.fail(&batch);
                    warn!(record = %self.record_id, error = %err, "Failed to save changes");
                    self.status.set(AutosaveStatus::failed(&err));
                    st.last_error = Some(err);
                }
            }
        }
    }

    /// Pick the resting status once the drain loop has nothing left
    fn settle(self: &Arc<Self>, st: &mut State) {
        if !st.timers.is_empty() {
            // Newer edits are still in their quiet period
            return;
        }
        let Some(session) = st.session.as_ref() else {
            return;
        };

        if session.coalescer.has_failures() {
            let status = match &st.last_error {
                Some(err) => AutosaveStatus::failed(err),
                None => AutosaveStatus::failed(&RemoteError::service("unknown failure")),
            };
            self.status.set(status);
        } else if self.status.state() == AutosaveState::Saving {
            // Not Saving means a reload reset the status while a write was out
            st.last_error = None;
            self.status.set(AutosaveStatus::saved());
            self.schedule_idle(st.edits);
        }
    }

    /// Fall back from Saved to Idle after the display duration
    fn schedule_idle(self: &Arc<Self>, edits_at: u64) {
        let Some(display) = self.config.saved_display else {
            return;
        };
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            let st = shared.state.lock();
            if st.edits == edits_at && shared.status.state() == AutosaveState::Saved {
                shared.status.set(AutosaveStatus::idle());
            }
        });
    }

    fn is_quiet(&self) -> bool {
        let st = self.state.lock();
        match st.session.as_ref() {
            Some(session) => st.timers.is_empty() && !st.flushing && !session.coalescer.has_ready(),
            None => true,
        }
    }
}
