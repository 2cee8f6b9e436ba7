//! Building the service handles for a command

use anyhow::{Context, Result};
use app::App;
use cache::LocalCache;
use cli_lib::system_config::{self, SystemConfig};
use remote::{RestClient, SessionHandle};
use std::sync::Arc;
use tracing::debug;

/// Open the local cache only (no backend needed)
pub fn open_cache() -> Result<LocalCache> {
    let dir = system_config::cache_dir().context("Could not determine cache directory")?;
    debug!(dir = %dir.display(), "Opening local cache");
    LocalCache::open(&dir).with_context(|| format!("Failed to open cache at {}", dir.display()))
}

/// Connect to the backend and restore the persisted session
pub fn connect(config: &SystemConfig) -> Result<App> {
    // 1. HTTP client sharing the session handle
    let session = SessionHandle::new();
    let client = Arc::new(
        RestClient::new(config.rest_config()?, session.clone())
            .context("Failed to create HTTP client")?,
    );

    // 2. Local cache
    let cache = open_cache()?;

    // 3. Services
    let app = App::new(client.clone(), client, session, cache, config.app_options());
    let restored = app
        .restore_session()
        .context("Failed to restore session")?;
    debug!(logged_in = restored.is_some(), url = %config.backend.url, "Connected");
    Ok(app)
}
