//! User settings page

use crate::adapters::SettingsAdapter;
use crate::{decode, App, AppError, Result};
use autosave::AutosaveCoordinator;
use axiom_core::{FieldSchema, RecordId, UserId, UserSettings};
use cache::keys;
use remote::Query;
use std::sync::Arc;
use tracing::debug;

/// Cached settings tagged with their owner
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CachedSettings {
    user: UserId,
    settings: UserSettings,
}

pub struct Settings<'a> {
    app: &'a App,
}

impl<'a> Settings<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// The current user's settings, served from the local cache unless `refresh`
    pub async fn load(&self, refresh: bool) -> Result<UserSettings> {
        let me = self.app.require_user()?;
        let fetch = move || async move {
            let row = self
                .app
                .store
                .select_single(&Query::table("user_settings").eq("id", me))
                .await?;
            Ok::<_, AppError>(CachedSettings {
                user: me,
                settings: decode(row)?,
            })
        };

        let cached = self
            .app
            .cache
            .get_or_fetch(keys::USER_SETTINGS, refresh, fetch)
            .await?;
        if cached.user == me {
            return Ok(cached.settings);
        }

        debug!(cached = %cached.user, user = %me, "Cached settings belong to another user");
        let fresh = self
            .app
            .cache
            .get_or_fetch(keys::USER_SETTINGS, true, fetch)
            .await?;
        Ok(fresh.settings)
    }

    /// Autosave coordinator for the settings toggles, loaded with fresh values
    pub async fn autosave(&self) -> Result<AutosaveCoordinator> {
        let me = self.app.require_user()?;
        let adapter = SettingsAdapter::new(Arc::clone(&self.app.store), Arc::clone(&self.app.cache));
        let coordinator = AutosaveCoordinator::new(
            RecordId::from(me),
            FieldSchema::user_settings(),
            Arc::new(adapter),
            self.app.options.settings_autosave,
        );

        let settings = self.load(true).await?;
        coordinator.load(settings.to_record());
        Ok(coordinator)
    }
}
