//! Entity rows exchanged with the remote store

use crate::error::ValidationError;
use crate::field::{EditableRecord, FieldValue};
use crate::ids::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a contributor holds on a project
///
/// The owner is not a contributor; ownership lives on the project row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May edit the project
    Collaborator,
    /// Read-only access
    Viewer,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collaborator => "collaborator",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collaborator" => Ok(Self::Collaborator),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// Project visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner and contributors can see the project
    #[default]
    Private,
    /// Anyone can see the project
    Public,
}

impl Visibility {
    /// Wire names of every visibility
    pub const ALL: &'static [&'static str] = &["private", "public"];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the `projects` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Owner
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_cover: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row of the `user_profiles` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub pfp_link: Option<String>,
    /// Self-described role ("student", "designer", ...), not a project role
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to the username
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Row of the `user_settings` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub trd_prefers_notification_ping: bool,
    pub trd_prefers_notification_badge: bool,
    pub trd_prefers_name_display: bool,
    pub trd_prefers_show_email: bool,
    pub trd_prefers_user_pfp: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            trd_prefers_notification_ping: false,
            trd_prefers_notification_badge: false,
            trd_prefers_name_display: false,
            trd_prefers_show_email: false,
            trd_prefers_user_pfp: true,
        }
    }
}

impl UserSettings {
    /// Convert into an editable record for autosave
    pub fn to_record(&self) -> EditableRecord {
        [
            ("trd_prefers_notification_ping", self.trd_prefers_notification_ping),
            ("trd_prefers_notification_badge", self.trd_prefers_notification_badge),
            ("trd_prefers_name_display", self.trd_prefers_name_display),
            ("trd_prefers_show_email", self.trd_prefers_show_email),
            ("trd_prefers_user_pfp", self.trd_prefers_user_pfp),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), FieldValue::Flag(value)))
        .collect()
    }
}

/// Profile fields shown next to a contributor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorProfile {
    pub id: Option<UserId>,
    pub name: String,
    pub avatar_url: String,
}

/// A non-owner user holding a role on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub user_id: UserId,
    pub role: Role,
    pub profile: ContributorProfile,
}

/// How the viewer relates to a profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Viewer owns the profile
    Edit,
    /// Viewer does not follow the profile yet
    Follow,
    /// Viewer already follows the profile
    Unfollow,
}
