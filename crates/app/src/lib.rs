//! Page-level services for the Axiom client
//!
//! This crate provides:
//! - Authentication (login, signup with profile wait, logout, last page)
//! - Projects (owned, collaborative, create, delete, settings autosave)
//! - Contributor management through the backend procedures
//! - Profiles (lookup, follow relation, edit)
//! - User settings with cached reads and autosave
//! - Persistence adapters wiring autosave coordinators to the store

pub mod adapters;
pub mod auth;
pub mod contributors;
pub mod error;
pub mod profiles;
pub mod projects;
pub mod settings;
pub mod site;

pub use error::{AppError, Result};

use autosave::AutosaveConfig;
use axiom_core::{RemoteError, UserId};
use cache::{keys, LocalCache};
use remote::{AuthProvider, IdentityProvider, RemoteStore, RetryPolicy, Session, SessionHandle};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Timing knobs for the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppOptions {
    pub project_autosave: AutosaveConfig,
    pub settings_autosave: AutosaveConfig,
    /// Wait for the profile row after signup
    pub signup_retry: RetryPolicy,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            project_autosave: AutosaveConfig::project(),
            settings_autosave: AutosaveConfig::settings(),
            signup_retry: RetryPolicy::default(),
        }
    }
}

/// Shared handles for every service
pub struct App {
    store: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    session: SessionHandle,
    cache: Arc<LocalCache>,
    options: AppOptions,
}

impl App {
    /// `session` must be the handle `store` reads its access token from
    pub fn new(
        store: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        session: SessionHandle,
        cache: LocalCache,
        options: AppOptions,
    ) -> Self {
        Self {
            store,
            auth,
            session,
            cache: Arc::new(cache),
            options,
        }
    }

    /// Reinstate the session persisted by a previous login
    pub fn restore_session(&self) -> Result<Option<Session>> {
        match self.cache.get::<Session>(keys::SESSION)? {
            Some(session) => {
                debug!(user = %session.user_id, "Restored session");
                self.session.set(session.clone());
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Current principal, if any
    pub fn current_user(&self) -> Option<UserId> {
        self.session.current_user_id()
    }

    /// Current principal, or `NotLoggedIn`
    ///
    /// Callers redirect to the login entry point on `NotLoggedIn`.
    pub fn require_user(&self) -> Result<UserId> {
        self.current_user().ok_or_else(|| {
            info!("No authenticated user");
            AppError::NotLoggedIn
        })
    }

    pub fn auth(&self) -> auth::Auth<'_> {
        auth::Auth::new(self)
    }

    pub fn projects(&self) -> projects::Projects<'_> {
        projects::Projects::new(self)
    }

    pub fn contributors(&self) -> contributors::Contributors<'_> {
        contributors::Contributors::new(self)
    }

    pub fn profiles(&self) -> profiles::Profiles<'_> {
        profiles::Profiles::new(self)
    }

    pub fn settings(&self) -> settings::Settings<'_> {
        settings::Settings::new(self)
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }
}

/// Decode a JSON row into an entity
pub(crate) fn decode<T: DeserializeOwned>(row: serde_json::Value) -> Result<T, RemoteError> {
    serde_json::from_value(row).map_err(|e| RemoteError::Decode(e.to_string()))
}
