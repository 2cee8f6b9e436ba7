//! Profile pages: lookup by username, follow relation, editing

use crate::{decode, App, AppError, Result};
use axiom_core::validate::{require_non_empty, sanitize_username};
use axiom_core::{Relation, RemoteError, UserId, UserProfile};
use cache::keys;
use remote::Query;
use serde_json::json;
use tracing::{debug, info};

/// Fields of the profile edit form
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: String,
    pub username: String,
    pub role: String,
    pub bio: String,
}

pub struct Profiles<'a> {
    app: &'a App,
}

impl<'a> Profiles<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Profile for a username; exactly one row must match
    pub async fn get_by_username(&self, raw: &str) -> Result<UserProfile> {
        let username = require_non_empty("username", sanitize_username(raw))?;
        let query = Query::table("user_profiles").eq("username", username);
        match self.app.store.select_single(&query).await {
            Ok(row) => Ok(decode(row)?),
            Err(RemoteError::NotFound(_)) | Err(RemoteError::Conflict(_)) => {
                Err(AppError::UserNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Which action the viewer gets on `profile`
    ///
    /// Anonymous viewers are offered Follow; the action itself then asks
    /// them to log in.
    pub async fn relation(&self, profile: &UserProfile) -> Result<Relation> {
        let Some(me) = self.app.current_user() else {
            return Ok(Relation::Follow);
        };
        if me == profile.id {
            return Ok(Relation::Edit);
        }

        let rows = self
            .app
            .store
            .select(
                &Query::table("user_relations")
                    .select("followed_id")
                    .eq("follower_id", me)
                    .eq("followed_id", profile.id)
                    .limit(1),
            )
            .await?;
        Ok(if rows.is_empty() {
            Relation::Follow
        } else {
            Relation::Unfollow
        })
    }

    /// Follow `user`, returning the viewer's new relation
    pub async fn follow(&self, user: UserId) -> Result<Relation> {
        let me = self.app.require_user()?;
        if me == user {
            return Ok(Relation::Edit);
        }

        let row = json!({
            "follower_id": me.to_string(),
            "followed_id": user.to_string(),
        });
        match self.app.store.insert("user_relations", row).await {
            Ok(_) => info!(%user, "Followed"),
            // Already following
            Err(RemoteError::Conflict(_)) => debug!(%user, "Follow already recorded"),
            Err(e) => return Err(e.into()),
        }
        Ok(Relation::Unfollow)
    }

    pub async fn unfollow(&self, user: UserId) -> Result<Relation> {
        let me = self.app.require_user()?;
        if me == user {
            return Ok(Relation::Edit);
        }

        let removed = self
            .app
            .store
            .delete(
                &Query::table("user_relations")
                    .eq("follower_id", me)
                    .eq("followed_id", user),
            )
            .await?;
        info!(%user, removed, "Unfollowed");
        Ok(Relation::Follow)
    }

    /// Save the edit form over the current user's profile
    pub async fn update_profile(&self, edit: &ProfileEdit) -> Result<UserProfile> {
        let name = require_non_empty("name", &edit.name)?;
        let username = require_non_empty("username", sanitize_username(&edit.username))?;
        let role = require_non_empty("role", &edit.role)?;
        let me = self.app.require_user()?;

        let updated = self
            .app
            .store
            .update(
                &Query::table("user_profiles").eq("id", me),
                json!({
                    "name": name,
                    "username": username,
                    "role": role,
                    "bio": edit.bio.trim(),
                }),
            )
            .await?;
        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(format!("profile {me}")))?;

        self.app.cache.invalidate(keys::USER_PROFILE)?;
        info!(user = %me, "Profile updated");
        Ok(decode(row)?)
    }

    /// The current user's profile, served from the local cache
    ///
    /// A cached profile that belongs to a different user is refetched.
    pub async fn cached_profile(&self, refresh: bool) -> Result<UserProfile> {
        let me = self.app.require_user()?;
        let cached = self
            .app
            .cache
            .get_or_fetch(keys::USER_PROFILE, refresh, move || self.fetch(me))
            .await?;
        if cached.id == me {
            return Ok(cached);
        }

        debug!(cached = %cached.id, user = %me, "Cached profile belongs to another user");
        self.app
            .cache
            .get_or_fetch(keys::USER_PROFILE, true, move || self.fetch(me))
            .await
    }

    async fn fetch(&self, id: UserId) -> Result<UserProfile> {
        let row = self
            .app
            .store
            .select_single(&Query::table("user_profiles").eq("id", id))
            .await?;
        Ok(decode(row)?)
    }
}
