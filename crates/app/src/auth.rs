//! Login, signup and logout

use crate::{site, App, AppError, Result};
use axiom_core::validate::{require_non_empty, sanitize_username};
use cache::keys;
use remote::{retry_until, Query, Session};
use serde_json::json;
use tracing::{debug, info, warn};

/// Fields of the signup form
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub username: String,
    /// Self-described role shown on the profile
    pub role: String,
}

pub struct Auth<'a> {
    app: &'a App,
}

impl<'a> Auth<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Operator notices for the auth page
    pub async fn notices(&self) -> Result<site::SiteNotices> {
        site::fetch(self.app.store.as_ref()).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = require_non_empty("email", email)?;
        require_non_empty("password", password)?;
        if !self.notices().await?.login_enabled {
            return Err(AppError::FeatureDisabled("Login"));
        }

        let session = self.app.auth.sign_in(email, password).await?;
        self.install(&session)?;
        info!(user = %session.user_id, "Logged in");
        Ok(session)
    }

    /// Register, wait for the backend to create the profile row, then fill it in
    pub async fn signup(&self, form: &SignupForm) -> Result<Session> {
        let email = require_non_empty("email", &form.email)?;
        require_non_empty("password", &form.password)?;
        let username = require_non_empty("username", sanitize_username(&form.username))?;
        let role = require_non_empty("role", &form.role)?;
        if !self.notices().await?.signup_enabled {
            return Err(AppError::FeatureDisabled("Signup"));
        }

        // 1. Create the account
        let session = self.app.auth.sign_up(email, &form.password).await?;
        self.install(&session)?;
        let user_id = session.user_id.to_string();
        info!(user = %user_id, "Account created");

        // 2. Wait for the profile row a backend trigger creates
        let store = self.app.store.as_ref();
        let probe = Query::table("user_profiles").select("id").eq("id", &user_id);
        retry_until(&self.app.options.signup_retry, |attempt| {
            debug!(attempt, "Waiting for profile row");
            store.select_maybe(&probe)
        })
        .await?;

        // 3. Fill in username and role
        let updated = store
            .update(
                &Query::table("user_profiles").eq("id", &user_id),
                json!({ "username": username, "role": role }),
            )
            .await?;
        if updated.is_empty() {
            return Err(AppError::ProfileNotReady {
                attempts: self.app.options.signup_retry.max_attempts,
            });
        }
        Ok(session)
    }

    /// Sign out and forget everything stored locally
    ///
    /// Local state is cleared even when the service could not be reached.
    pub async fn logout(&self) -> Result<()> {
        if let Some(session) = self.app.session.clear() {
            if let Err(e) = self.app.auth.sign_out(&session).await {
                warn!(error = %e, "Remote sign out failed");
            }
            info!(user = %session.user_id, "Logged out");
        }
        let removed = self.app.cache.clear()?;
        debug!(removed, "Local cache cleared");
        Ok(())
    }

    /// Remember the page to return to after login
    pub fn remember_page(&self, path: &str) -> Result<()> {
        self.app.cache.put(keys::LAST_PAGE, &path.to_string())?;
        Ok(())
    }

    /// Page to return to after login (`/` when none was recorded)
    pub fn last_page(&self) -> Result<String> {
        Ok(self
            .app
            .cache
            .get::<String>(keys::LAST_PAGE)?
            .unwrap_or_else(|| "/".to_string()))
    }

    fn install(&self, session: &Session) -> Result<()> {
        self.app.session.set(session.clone());
        self.app.cache.put(keys::SESSION, session)?;
        Ok(())
    }
}
