//! Authenticated session and the identity boundary

use axiom_core::UserId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tokens issued by the identity provider for one principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: UserId,
    pub email: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Read-only view of the current principal
pub trait IdentityProvider: Send + Sync {
    /// `None` means unauthenticated
    fn current_user_id(&self) -> Option<UserId>;
}

/// Shared slot holding the active session
///
/// Cloned into every client that needs the access token; all clones see the
/// same session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: Session) {
        *self.inner.write() = Some(session);
    }

    /// Remove the session, returning it
    pub fn clear(&self) -> Option<Session> {
        self.inner.write().take()
    }

    pub fn get(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|s| s.access_token.clone())
    }
}

impl IdentityProvider for SessionHandle {
    fn current_user_id(&self) -> Option<UserId> {
        let now = Utc::now();
        self.inner
            .read()
            .as_ref()
            .filter(|s| !s.is_expired(now))
            .map(|s| s.user_id)
    }
}
