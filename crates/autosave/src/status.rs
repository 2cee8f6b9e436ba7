//! Autosave status reported to the presentation layer

use axiom_core::RemoteError;
use std::fmt;
use tokio::sync::watch;

/// Coarse autosave state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    /// Nothing pending
    Idle,
    /// An edit is waiting for its quiet period or a write is in flight
    /// (also reported while the baseline is still loading)
    Saving,
    /// The last write succeeded
    Saved,
    /// The last write failed
    Error,
}

/// State plus the message shown next to the indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveStatus {
    pub state: AutosaveState,
    pub message: String,
}

impl AutosaveStatus {
    fn new(state: AutosaveState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }

    /// Baseline not loaded yet
    pub fn starting() -> Self {
        Self::new(AutosaveState::Saving, "Autosave is starting")
    }

    pub fn idle() -> Self {
        Self::new(AutosaveState::Idle, "All changes saved")
    }

    pub fn saving() -> Self {
        Self::new(AutosaveState::Saving, "Saving changes…")
    }

    pub fn saved() -> Self {
        Self::new(AutosaveState::Saved, "Changes saved")
    }

    /// Error status with a message matching the failure kind
    pub fn failed(err: &RemoteError) -> Self {
        let message = match err {
            RemoteError::PermissionDenied(_) => {
                "You do not have permission to edit this. Request access from the owner.".to_string()
            }
            RemoteError::NotFound(_) => "This record no longer exists.".to_string(),
            RemoteError::Unauthenticated => "Your session has expired. Log in again.".to_string(),
            other => format!("Failed to save changes: {other}"),
        };
        Self::new(AutosaveState::Error, message)
    }

    pub fn is_saving(&self) -> bool {
        self.state == AutosaveState::Saving
    }
}

impl fmt::Display for AutosaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Owner side of the status channel
pub(crate) struct StatusReporter {
    tx: watch::Sender<AutosaveStatus>,
}

impl StatusReporter {
    pub(crate) fn new(initial: AutosaveStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a status, notifying subscribers only when it changed
    pub(crate) fn set(&self, status: AutosaveStatus) {
        self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    pub(crate) fn get(&self) -> AutosaveStatus {
        self.tx.borrow().clone()
    }

    pub(crate) fn state(&self) -> AutosaveState {
        self.tx.borrow().state
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<AutosaveStatus> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_by_kind() {
        let denied = AutosaveStatus::failed(&RemoteError::PermissionDenied("rls".into()));
        assert_eq!(denied.state, AutosaveState::Error);
        assert!(denied.message.contains("Request access"));

        let network = AutosaveStatus::failed(&RemoteError::Network("reset".into()));
        assert_eq!(network.message, "Failed to save changes: network error: reset");
    }

    #[test]
    fn test_reporter_skips_duplicate_notifications() {
        let reporter = StatusReporter::new(AutosaveStatus::idle());
        let mut rx = reporter.subscribe();

        reporter.set(AutosaveStatus::idle());
        assert!(!rx.has_changed().unwrap());

        reporter.set(AutosaveStatus::saving());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, AutosaveState::Saving);
    }
}
