//! Per-field debouncing
//!
//! One cancellable timer per field. Re-arming a field aborts its previous
//! timer, so a field never has more than one quiet period running.

use std::collections::HashMap;
use tokio::task::AbortHandle;

struct Timer {
    generation: u64,
    handle: AbortHandle,
}

/// Table of armed quiet-period timers, keyed by field name
#[derive(Default)]
pub struct TimerTable {
    timers: HashMap<String, Timer>,
    next_generation: u64,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a generation number for the next timer
    ///
    /// The spawned timer carries this number back to [`TimerTable::fire`] so
    /// that a timer whose abort raced with its own expiry is ignored.
    pub fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Install a timer for `field`, aborting the one it replaces
    ///
    /// Returns true when an earlier timer was cancelled.
    pub fn arm(&mut self, field: &str, generation: u64, handle: AbortHandle) -> bool {
        match self.timers.insert(field.to_string(), Timer { generation, handle }) {
            Some(previous) => {
                previous.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Claim an expired timer
    ///
    /// Removes the entry and returns true only if `generation` is still the
    /// current timer for `field`.
    pub fn fire(&mut self, field: &str, generation: u64) -> bool {
        match self.timers.get(field) {
            Some(timer) if timer.generation == generation => {
                self.timers.remove(field);
                true
            }
            _ => false,
        }
    }

    /// Abort every timer, returning the fields that were still waiting
    pub fn cancel_all(&mut self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .timers
            .drain()
            .map(|(field, timer)| {
                timer.handle.abort();
                field
            })
            .collect();
        fields.sort();
        fields
    }

    pub fn is_armed(&self, field: &str) -> bool {
        self.timers.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TimerTable {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            timer.handle.abort();
        }
    }
}
