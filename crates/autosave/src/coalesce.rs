//! Coalescing of field edits into flush batches
//!
//! Tracks which fields are due for a write and what the remote store last
//! accepted for each field. A batch never carries a field whose value equals
//! the persisted one.

use axiom_core::{EditableRecord, FieldMap, FieldSchema};
use std::collections::BTreeSet;

/// Pending-write bookkeeping for one record
#[derive(Debug, Default)]
pub struct Coalescer {
    /// Last value the remote store accepted, per field
    persisted: FieldMap,
    /// Fields whose quiet period elapsed, waiting for the next flush
    ready: BTreeSet<String>,
    /// Fields currently being written
    in_flight: BTreeSet<String>,
    /// Fields whose most recent write failed
    failed: BTreeSet<String>,
}

impl Coalescer {
    /// Start from the loaded baseline
    pub fn new(baseline: &EditableRecord) -> Self {
        Self {
            persisted: baseline.fields().clone(),
            ..Self::default()
        }
    }

    /// Quiet period elapsed for `field`
    pub fn mark_ready(&mut self, field: &str) {
        self.ready.insert(field.to_string());
    }

    /// A new edit restarted the quiet period for `field`
    pub fn unready(&mut self, field: &str) {
        self.ready.remove(field);
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Drain ready fields into a batch of changed values
    ///
    /// Values are read from `record` at this moment, so a batch queued behind
    /// an in-flight write carries the latest local value. Unknown and
    /// unchanged fields are dropped; an unchanged field also stops counting
    /// as failed.
    pub fn take_batch(&mut self, record: &EditableRecord, schema: &FieldSchema) -> FieldMap {
        let mut batch = FieldMap::new();
        for field in std::mem::take(&mut self.ready) {
            let Some(value) = record.get(&field) else {
                continue;
            };
            if self.persisted.get(&field) == Some(value) {
                self.failed.remove(&field);
                continue;
            }
            batch.insert(field, value.clone());
        }

        let batch = schema.filter(&batch);
        self.in_flight = batch.keys().cloned().collect();
        batch
    }

    /// The batch was written
    pub fn commit(&mut self, batch: &FieldMap) {
        for (field, value) in batch {
            self.persisted.insert(field.clone(), value.clone());
            self.failed.remove(field);
        }
        self.in_flight.clear();
    }

    /// The batch was rejected; local values are kept as they are
    pub fn fail(&mut self, batch: &FieldMap) {
        self.failed.extend(batch.keys().cloned());
        self.in_flight.clear();
    }

    /// Queue every failed field that still differs from the persisted value
    ///
    /// Fields for which `waiting` holds are left alone: a newer edit is in its
    /// quiet period and its own timer will send them. Returns the number of
    /// fields queued.
    pub fn requeue_failed(
        &mut self,
        record: &EditableRecord,
        waiting: impl Fn(&str) -> bool,
    ) -> usize {
        let persisted = &self.persisted;
        let (retry, settled): (Vec<String>, Vec<String>) = self
            .failed
            .iter()
            .filter(|field| !waiting(field.as_str()))
            .cloned()
            .partition(|field| record.get(field) != persisted.get(field));

        for field in settled {
            self.failed.remove(&field);
        }
        let count = retry.len();
        self.ready.extend(retry);
        count
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn is_failed(&self, field: &str) -> bool {
        self.failed.contains(field)
    }

    /// True while `field` is queued or being written
    pub fn is_pending(&self, field: &str) -> bool {
        self.ready.contains(field) || self.in_flight.contains(field)
    }

    pub fn persisted(&self) -> &FieldMap {
        &self.persisted
    }

    pub(crate) fn persisted_mut(&mut self) -> &mut FieldMap {
        &mut self.persisted
    }

    pub(crate) fn forget_failure(&mut self, field: &str) {
        self.failed.remove(field);
    }
}
