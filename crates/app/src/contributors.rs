//! Contributor management for the project settings page
//!
//! Reads use one joined query; every mutation goes through the backend
//! procedures, which carry the owner-only permission checks.

use crate::{App, AppError, Result};
use axiom_core::validate::{parse_role, require_non_empty, sanitize_username};
use axiom_core::{Contributor, ContributorProfile, ProjectId, RemoteError, Role, UserId};
use remote::{Embed, Query};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Contributors of one project as shown on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    project: ProjectId,
    entries: Vec<Contributor>,
}

impl Roster {
    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn entries(&self) -> &[Contributor] {
        &self.entries
    }

    pub fn get(&self, user: UserId) -> Option<&Contributor> {
        self.entries.iter().find(|c| c.user_id == user)
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.get(user).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_entry(&mut self, user: UserId) {
        self.entries.retain(|c| c.user_id != user);
    }
}

/// Result of a mutation on an existing contributor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    Applied,
    /// The contributor was already gone; the roster entry was dropped
    AlreadyGone,
}

pub struct Contributors<'a> {
    app: &'a App,
}

impl<'a> Contributors<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Fetch the roster with one joined query
    ///
    /// Any failure, including a row that cannot be decoded, aborts the whole
    /// fetch.
    pub async fn list(&self, project: ProjectId) -> Result<Roster> {
        let query = Query::table("project_contributors")
            .select("user_id,role")
            .embed(Embed::new("user_profiles", "id,name,pfp_link").on("user_id", "id"))
            .eq("project_id", project);
        let rows = self.app.store.select(&query).await?;

        let entries = rows
            .iter()
            .map(contributor_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Roster { project, entries })
    }

    /// Add a user by username
    ///
    /// The duplicate check runs before the procedure is called.
    pub async fn add(&self, roster: &mut Roster, username: &str, role: &str) -> Result<Contributor> {
        let username = require_non_empty("username", sanitize_username(username))?;
        let role = parse_role(role)?;

        // 1. Resolve the username
        let profile = self
            .app
            .store
            .select_maybe(
                &Query::table("user_profiles")
                    .select("id,name,pfp_link")
                    .eq("username", username),
            )
            .await?
            .ok_or(AppError::UserNotFound)?;
        let user_id = user_id_of(&profile, "id")?;

        // 2. Reject duplicates, locally and remotely
        if roster.contains(user_id) {
            return Err(AppError::AlreadyContributor);
        }
        let existing = self
            .app
            .store
            .select(
                &Query::table("project_contributors")
                    .select("user_id")
                    .eq("user_id", user_id)
                    .eq("project_id", roster.project),
            )
            .await?;
        if !existing.is_empty() {
            return Err(AppError::AlreadyContributor);
        }

        // 3. Add through the procedure
        let args = json!({
            "p_project_id": roster.project.to_string(),
            "p_user_id": user_id.to_string(),
            "p_role": role.as_str(),
        });
        match self.app.store.rpc("add_contributor", args).await {
            Ok(_) => {}
            Err(RemoteError::Conflict(_)) => return Err(AppError::AlreadyContributor),
            Err(e) => return Err(e.into()),
        }

        let contributor = Contributor {
            user_id,
            role,
            profile: profile_of(Some(&profile)),
        };
        roster.entries.push(contributor.clone());
        info!(project = %roster.project, user = %user_id, %role, "Contributor added");
        Ok(contributor)
    }

    pub async fn update_role(
        &self,
        roster: &mut Roster,
        user: UserId,
        role: Role,
    ) -> Result<RosterChange> {
        let args = json!({
            "p_project_id": roster.project.to_string(),
            "p_user_id": user.to_string(),
            "p_role": role.as_str(),
        });
        match self.app.store.rpc("update_contributor_role", args).await {
            Ok(_) => {
                if let Some(entry) = roster.entries.iter_mut().find(|c| c.user_id == user) {
                    entry.role = role;
                }
                info!(project = %roster.project, user = %user, %role, "Contributor role updated");
                Ok(RosterChange::Applied)
            }
            Err(RemoteError::NotFound(reason)) => {
                warn!(project = %roster.project, user = %user, %reason, "Contributor already removed");
                roster.drop_entry(user);
                Ok(RosterChange::AlreadyGone)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, roster: &mut Roster, user: UserId) -> Result<RosterChange> {
        let args = json!({
            "p_project_id": roster.project.to_string(),
            "p_user_id": user.to_string(),
        });
        let change = match self.app.store.rpc("remove_contributor", args).await {
            Ok(_) => RosterChange::Applied,
            Err(RemoteError::NotFound(reason)) => {
                warn!(project = %roster.project, user = %user, %reason, "Contributor already removed");
                RosterChange::AlreadyGone
            }
            Err(e) => return Err(e.into()),
        };
        roster.drop_entry(user);
        info!(project = %roster.project, user = %user, "Contributor removed");
        Ok(change)
    }
}

fn user_id_of(row: &Value, column: &str) -> Result<UserId, RemoteError> {
    row.get(column)
        .and_then(Value::as_str)
        .ok_or_else(|| RemoteError::Decode(format!("row without {column}")))?
        .parse::<UserId>()
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

fn profile_of(profile: Option<&Value>) -> ContributorProfile {
    let text = |column: &str| {
        profile
            .and_then(|p| p.get(column))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    ContributorProfile {
        id: text("id").and_then(|id| id.parse().ok()),
        name: text("name").unwrap_or_else(|| "Unknown".to_string()),
        avatar_url: text("pfp_link").unwrap_or_default(),
    }
}

fn contributor_from_row(row: &Value) -> Result<Contributor, RemoteError> {
    let user_id = user_id_of(row, "user_id")?;
    let role = row
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .parse::<Role>()
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
    let profile = row.get("user_profiles").filter(|p| !p.is_null());

    Ok(Contributor {
        user_id,
        role,
        profile: profile_of(profile),
    })
}

