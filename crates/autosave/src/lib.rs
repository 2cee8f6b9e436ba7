//! Debounced autosave for editable records
//!
//! This crate provides:
//! - Per-field debouncing (quiet period configurable per call site)
//! - Coalescing of rapid edits, last write wins
//! - Serialized flushes (at most one write in flight per record)
//! - Filtering of unknown and unchanged fields before every write
//! - Status reporting (Idle / Saving / Saved / Error) over a watch channel

pub mod adapter;
pub mod coalesce;
pub mod coordinator;
pub mod debounce;
pub mod reconcile;
pub mod status;

pub use adapter::PersistenceAdapter;
pub use coordinator::{AutosaveCoordinator, EditOutcome, EditRejection};
pub use status::{AutosaveState, AutosaveStatus};

use std::time::Duration;

/// Timing configuration for one coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit to a field before it is flushed
    pub quiet_period: Duration,
    /// How long Saved is shown before falling back to Idle (`None` keeps Saved)
    pub saved_display: Option<Duration>,
}

impl AutosaveConfig {
    /// Project settings page: text inputs, 3s quiet period
    pub fn project() -> Self {
        Self {
            quiet_period: Duration::from_millis(3000),
            ..Self::default()
        }
    }

    /// User settings page: toggles, 500ms quiet period
    pub fn settings() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            ..Self::default()
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(3000),
            saved_display: Some(Duration::from_millis(2000)),
        }
    }
}
