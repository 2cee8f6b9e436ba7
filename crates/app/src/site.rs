//! Operator notices shown on the auth page
//!
//! The `axiomSiteSettings` table carries a map of messages; each can switch
//! off signup or login and may be flagged as a banner.

use crate::Result;
use axiom_core::RemoteError;
use remote::{Query, RemoteStore};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
struct SiteMessage {
    #[serde(default)]
    disabled_features: Vec<String>,
    #[serde(default)]
    error_destructive: bool,
    #[serde(default)]
    error_title: String,
    #[serde(default)]
    error_message: String,
}

/// Banner text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// What the operators currently allow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteNotices {
    pub signup_enabled: bool,
    pub login_enabled: bool,
    pub banner: Option<Notice>,
}

impl Default for SiteNotices {
    fn default() -> Self {
        Self {
            signup_enabled: true,
            login_enabled: true,
            banner: None,
        }
    }
}

/// Fetch the notices; a missing settings table means nothing is disabled
pub async fn fetch(store: &dyn RemoteStore) -> Result<SiteNotices> {
    let query = Query::table("axiomSiteSettings").select("error_messages").limit(1);
    let rows = match store.select(&query).await {
        Ok(rows) => rows,
        Err(RemoteError::NotFound(_)) => return Ok(SiteNotices::default()),
        Err(e) => return Err(e.into()),
    };

    let raw = rows
        .into_iter()
        .next()
        .and_then(|mut row| row.get_mut("error_messages").map(serde_json::Value::take));
    let Some(raw) = raw else {
        return Ok(SiteNotices::default());
    };

    let messages: BTreeMap<String, SiteMessage> = match serde_json::from_value(raw) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "Unexpected error_messages format");
            return Ok(SiteNotices::default());
        }
    };

    let mut notices = SiteNotices::default();
    for message in messages.into_values() {
        if message.disabled_features.iter().any(|f| f == "signup") {
            notices.signup_enabled = false;
        }
        if message.disabled_features.iter().any(|f| f == "signin") {
            notices.login_enabled = false;
        }
        if message.error_destructive {
            notices.banner = Some(Notice {
                title: message.error_title,
                message: message.error_message,
            });
        }
    }
    Ok(notices)
}
