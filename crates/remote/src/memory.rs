//! In-memory remote store
//!
//! Stands in for the hosted backend in tests and offline runs:
//! - Tables of JSON rows with equality filters, embeds and ordering
//! - A small row-level security model (owners write their rows)
//! - The contributor procedures with their permission checks
//! - Email/password accounts; signup creates the profile row like the
//!   backend trigger does (can be switched off to exercise the wait)
//! - Failure injection and a call log

use crate::auth::AuthProvider;
use crate::query::{value_eq, Query};
use crate::session::{IdentityProvider, Session, SessionHandle};
use crate::store::RemoteStore;
use async_trait::async_trait;
use axiom_core::{RemoteError, Role, UserId, UserSettings};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

const RLS_DENIED: &str = "new row violates row-level security policy";

struct Account {
    password: String,
    user_id: UserId,
}

/// Remote store backed by process memory
pub struct MemoryStore {
    tables: DashMap<String, Vec<Value>>,
    accounts: Mutex<HashMap<String, Account>>,
    session: SessionHandle,
    failures: Mutex<HashMap<String, VecDeque<RemoteError>>>,
    calls: Mutex<Vec<String>>,
    auto_profiles: AtomicBool,
}

impl MemoryStore {
    /// Empty store; `session` decides who the caller is
    pub fn new(session: SessionHandle) -> Self {
        Self {
            tables: DashMap::new(),
            accounts: Mutex::new(HashMap::new()),
            session,
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            auto_profiles: AtomicBool::new(true),
        }
    }

    /// Whether signup creates the profile and settings rows
    pub fn set_auto_profiles(&self, enabled: bool) {
        self.auto_profiles.store(enabled, Ordering::SeqCst);
    }

    /// Insert a row without any permission check
    pub fn seed(&self, table: &str, row: Value) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    /// Snapshot of a table
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .get(table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Make the next call to `op` fail
    ///
    /// `op` has the form used in [`calls`](Self::calls), e.g. `"update projects"`
    /// or `"rpc add_contributor"`.
    pub fn fail_next(&self, op: &str, err: RemoteError) {
        self.failures
            .lock()
            .entry(op.to_string())
            .or_default()
            .push_back(err);
    }

    /// Every operation issued so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls to `op`
    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == op).count()
    }

    fn record(&self, op: String) -> Result<(), RemoteError> {
        debug!(op = %op, "memory store call");
        self.calls.lock().push(op.clone());
        match self.failures.lock().get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn me(&self) -> Result<UserId, RemoteError> {
        self.session
            .current_user_id()
            .ok_or(RemoteError::Unauthenticated)
    }

    /// Row-level security for writes to an existing or new row
    fn may_write(&self, table: &str, row: &Value, me: UserId, deleting: bool) -> bool {
        let me = me.to_string();
        let is = |column: &str| row.get(column).is_some_and(|v| value_eq(v, &me));
        match table {
            "projects" => {
                if is("user_id") {
                    return true;
                }
                // Collaborators may edit, never delete
                !deleting
                    && row
                        .get("id")
                        .and_then(Value::as_str)
                        .is_some_and(|project| self.role_of(project, &me) == Some(Role::Collaborator))
            }
            "user_profiles" | "user_settings" => is("id"),
            "user_relations" => is("follower_id"),
            // Contributor rows change only through the procedures
            "project_contributors" => false,
            _ => true,
        }
    }

    fn role_of(&self, project: &str, user: &str) -> Option<Role> {
        self.tables.get("project_contributors").and_then(|rows| {
            rows.iter()
                .find(|r| field_is(r, "project_id", project) && field_is(r, "user_id", user))
                .and_then(|r| r.get("role").and_then(Value::as_str))
                .and_then(|role| role.parse().ok())
        })
    }

    fn project_owner(&self, project: &str) -> Result<String, RemoteError> {
        self.tables
            .get("projects")
            .and_then(|rows| {
                rows.iter()
                    .find(|r| field_is(r, "id", project))
                    .and_then(|r| r.get("user_id").and_then(Value::as_str).map(str::to_string))
            })
            .ok_or_else(|| RemoteError::NotFound(format!("project {project} does not exist")))
    }

    /// Unique keys per table
    fn unique_keys(table: &str) -> &'static [&'static [&'static str]] {
        match table {
            "project_contributors" => &[&["project_id", "user_id"]],
            "user_relations" => &[&["follower_id", "followed_id"]],
            "user_profiles" => &[&["id"], &["username"]],
            "user_settings" | "projects" => &[&["id"]],
            _ => &[],
        }
    }

    fn insert_row(&self, table: &str, mut row: Value) -> Result<Value, RemoteError> {
        if let Some(obj) = row.as_object_mut() {
            let keyed_by_id = Self::unique_keys(table).iter().any(|key| *key == ["id"]);
            if keyed_by_id && !obj.contains_key("id") {
                obj.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
            }
        }

        let mut rows = self.tables.entry(table.to_string()).or_default();
        for key in Self::unique_keys(table) {
            let duplicate = rows.iter().any(|existing| {
                key.iter().all(|column| match (existing.get(*column), row.get(*column)) {
                    (Some(a), Some(b)) => !a.is_null() && a == b,
                    _ => false,
                })
            });
            if duplicate {
                return Err(RemoteError::Conflict(format!(
                    "duplicate key value violates unique constraint on {table}({})",
                    key.join(",")
                )));
            }
        }
        rows.push(row.clone());
        Ok(row)
    }

    fn project(row: &Value, query: &Query, tables: &DashMap<String, Vec<Value>>) -> Value {
        let mut out = if query.columns() == "*" {
            row.as_object().cloned().unwrap_or_default()
        } else {
            pick(row, query.columns())
        };

        for embed in query.embeds() {
            let key = row.get(&embed.local).cloned().unwrap_or(Value::Null);
            let related = tables.get(&embed.table).and_then(|rows| {
                rows.iter()
                    .find(|r| !key.is_null() && r.get(&embed.foreign) == Some(&key))
                    .map(|r| {
                        if embed.columns == "*" {
                            r.clone()
                        } else {
                            Value::Object(pick(r, &embed.columns))
                        }
                    })
            });
            out.insert(embed.table.clone(), related.unwrap_or(Value::Null));
        }
        Value::Object(out)
    }

    fn procedure(&self, name: &str, args: &Value) -> Result<Value, RemoteError> {
        let me = self.me()?.to_string();
        let arg = |key: &str| {
            args.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RemoteError::Service {
                    code: Some("PGRST202".into()),
                    message: format!("missing argument {key}"),
                })
        };
        let project = arg("p_project_id")?;
        let user = arg("p_user_id")?;

        if self.project_owner(&project)? != me {
            return Err(RemoteError::PermissionDenied(
                "only the project owner can manage contributors".into(),
            ));
        }

        match name {
            "add_contributor" => {
                let role: Role = arg("p_role")?.parse().map_err(|e: axiom_core::ValidationError| {
                    RemoteError::Service {
                        code: Some("P0001".into()),
                        message: e.to_string(),
                    }
                })?;
                if user == me {
                    return Err(RemoteError::Conflict("the owner cannot be a contributor".into()));
                }
                let known = self
                    .tables
                    .get("user_profiles")
                    .is_some_and(|rows| rows.iter().any(|r| field_is(r, "id", &user)));
                if !known {
                    return Err(RemoteError::NotFound(format!("user {user} does not exist")));
                }
                self.insert_row(
                    "project_contributors",
                    json!({ "project_id": project, "user_id": user, "role": role.as_str() }),
                )?;
                Ok(Value::Null)
            }
            "update_contributor_role" => {
                let role: Role = arg("p_role")?.parse().map_err(|e: axiom_core::ValidationError| {
                    RemoteError::Service {
                        code: Some("P0001".into()),
                        message: e.to_string(),
                    }
                })?;
                let mut rows = self.tables.entry("project_contributors".into()).or_default();
                let row = rows
                    .iter_mut()
                    .find(|r| field_is(r, "project_id", &project) && field_is(r, "user_id", &user))
                    .ok_or_else(|| RemoteError::NotFound("contributor not found".into()))?;
                row["role"] = json!(role.as_str());
                Ok(Value::Null)
            }
            "remove_contributor" => {
                let mut rows = self.tables.entry("project_contributors".into()).or_default();
                let before = rows.len();
                rows.retain(|r| !(field_is(r, "project_id", &project) && field_is(r, "user_id", &user)));
                if rows.len() == before {
                    return Err(RemoteError::NotFound("contributor not found".into()));
                }
                Ok(Value::Null)
            }
            _ => unknown_procedure(name),
        }
    }
}

fn unknown_procedure(name: &str) -> Result<Value, RemoteError> {
    Err(RemoteError::NotFound(format!(
        "could not find the function public.{name}"
    )))
}

fn field_is(row: &Value, column: &str, expected: &str) -> bool {
    row.get(column).is_some_and(|v| value_eq(v, expected))
}

fn pick(row: &Value, columns: &str) -> Map<String, Value> {
    columns
        .split(',')
        .map(str::trim)
        .filter_map(|c| row.get(c).map(|v| (c.to_string(), v.clone())))
        .collect()
}

fn sort_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, RemoteError> {
        self.record(format!("select {}", query.table_name()))?;

        let mut rows: Vec<Value> = self
            .tables
            .get(query.table_name())
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, ascending)) = query.ordering() {
            rows.sort_by_key(|r| sort_key(r.get(column)));
            if !ascending {
                rows.reverse();
            }
        }
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }

        Ok(rows
            .iter()
            .map(|r| Self::project(r, query, &self.tables))
            .collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        self.record(format!("insert {table}"))?;
        let me = self.me()?;
        if !self.may_write(table, &row, me, false) {
            return Err(RemoteError::PermissionDenied(RLS_DENIED.into()));
        }
        self.insert_row(table, row)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, RemoteError> {
        let table = query.table_name();
        self.record(format!("update {table}"))?;
        let me = self.me()?;

        let targets: Vec<usize> = self
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .enumerate()
                    .filter(|(_, r)| query.matches(r))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default();
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let current = self.rows(table);
        if targets.iter().any(|&i| !self.may_write(table, &current[i], me, false)) {
            return Err(RemoteError::PermissionDenied(RLS_DENIED.into()));
        }

        let mut rows = self.tables.entry(table.to_string()).or_default();
        let mut updated = Vec::with_capacity(targets.len());
        for i in targets {
            if let (Some(row), Some(changes)) = (rows[i].as_object_mut(), patch.as_object()) {
                for (column, value) in changes {
                    row.insert(column.clone(), value.clone());
                }
            }
            updated.push(rows[i].clone());
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<usize, RemoteError> {
        let table = query.table_name();
        self.record(format!("delete {table}"))?;
        let me = self.me()?;

        let current = self.rows(table);
        let doomed: Vec<&Value> = current.iter().filter(|r| query.matches(r)).collect();
        if doomed.iter().any(|r| !self.may_write(table, r, me, true)) {
            return Err(RemoteError::PermissionDenied(RLS_DENIED.into()));
        }

        let mut rows = self.tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok(before - rows.len())
    }

    async fn rpc(&self, name: &str, args: Value) -> Result<Value, RemoteError> {
        self.record(format!("rpc {name}"))?;
        match name {
            "add_contributor" | "update_contributor_role" | "remove_contributor" => {
                self.procedure(name, &args)
            }
            _ => unknown_procedure(name),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.record("auth sign_in".to_string())?;
        let accounts = self.accounts.lock();
        match accounts.get(email) {
            Some(account) if account.password == password => Ok(memory_session(email, account.user_id)),
            _ => Err(RemoteError::Service {
                code: Some("invalid_credentials".into()),
                message: "Invalid login credentials".into(),
            }),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.record("auth sign_up".to_string())?;
        let user_id = {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(email) {
                return Err(RemoteError::Conflict("User already registered".into()));
            }
            let user_id = UserId::new_v4();
            accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user_id,
                },
            );
            user_id
        };

        if self.auto_profiles.load(Ordering::SeqCst) {
            self.seed("user_profiles", json!({ "id": user_id.to_string() }));
            let mut settings = serde_json::to_value(UserSettings::default())
                .map_err(|e| RemoteError::Decode(e.to_string()))?;
            settings["id"] = json!(user_id.to_string());
            self.seed("user_settings", settings);
        }
        Ok(memory_session(email, user_id))
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), RemoteError> {
        self.record("auth sign_out".to_string())
    }
}

fn memory_session(email: &str, user_id: UserId) -> Session {
    Session {
        access_token: format!("memory-{}", uuid::Uuid::new_v4()),
        refresh_token: None,
        user_id,
        email: email.to_string(),
        expires_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Embed;

    fn store() -> (MemoryStore, SessionHandle) {
        let session = SessionHandle::new();
        (MemoryStore::new(session.clone()), session)
    }

    async fn login(store: &MemoryStore, session: &SessionHandle, email: &str) -> UserId {
        let s = store.sign_up(email, "pw").await.unwrap();
        let id = s.user_id;
        session.set(s);
        id
    }

    #[tokio::test]
    async fn test_select_with_embed() {
        let (store, _) = store();
        store.seed("user_profiles", json!({ "id": "u1", "name": "Ada", "pfp_link": "a.png" }));
        store.seed("project_contributors", json!({ "project_id": "p1", "user_id": "u1", "role": "viewer" }));
        store.seed("project_contributors", json!({ "project_id": "p1", "user_id": "u2", "role": "collaborator" }));

        let query = Query::table("project_contributors")
            .select("user_id,role")
            .embed(Embed::new("user_profiles", "name").on("user_id", "id"))
            .eq("project_id", "p1")
            .order("user_id", true);
        let rows = store.select(&query).await.unwrap();

        assert_eq!(
            rows,
            vec![
                json!({ "user_id": "u1", "role": "viewer", "user_profiles": { "name": "Ada" } }),
                json!({ "user_id": "u2", "role": "collaborator", "user_profiles": null }),
            ]
        );
    }

    #[tokio::test]
    async fn test_writes_require_session() {
        let (store, _) = store();
        let err = store
            .insert("projects", json!({ "title": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_row_level_security_on_projects() {
        let (store, session) = store();
        let owner = login(&store, &session, "owner@example.com").await;
        let project = store
            .insert("projects", json!({ "title": "Atlas", "user_id": owner.to_string() }))
            .await
            .unwrap();
        let id = project["id"].as_str().unwrap().to_string();

        login(&store, &session, "other@example.com").await;
        let err = store
            .update(&Query::table("projects").eq("id", &id), json!({ "title": "Mine" }))
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(store.delete(&Query::table("projects").eq("id", &id)).await.is_err());
        assert_eq!(store.rows("projects")[0]["title"], "Atlas");
    }

    #[tokio::test]
    async fn test_contributor_procedures() {
        let (store, session) = store();
        let guest = login(&store, &session, "guest@example.com").await;
        let owner = login(&store, &session, "owner@example.com").await;
        store.seed("projects", json!({ "id": "p1", "user_id": owner.to_string() }));

        let args = json!({ "p_project_id": "p1", "p_user_id": guest.to_string(), "p_role": "viewer" });
        store.rpc("add_contributor", args.clone()).await.unwrap();
        assert!(matches!(
            store.rpc("add_contributor", args).await,
            Err(RemoteError::Conflict(_))
        ));

        store
            .rpc(
                "update_contributor_role",
                json!({ "p_project_id": "p1", "p_user_id": guest.to_string(), "p_role": "collaborator" }),
            )
            .await
            .unwrap();
        assert_eq!(store.rows("project_contributors")[0]["role"], "collaborator");

        let remove = json!({ "p_project_id": "p1", "p_user_id": guest.to_string() });
        store.rpc("remove_contributor", remove.clone()).await.unwrap();
        assert!(store.rpc("remove_contributor", remove).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_only_owner_manages_contributors() {
        let (store, session) = store();
        let owner = login(&store, &session, "owner@example.com").await;
        store.seed("projects", json!({ "id": "p1", "user_id": owner.to_string() }));
        let guest = login(&store, &session, "guest@example.com").await;

        let err = store
            .rpc(
                "add_contributor",
                json!({ "p_project_id": "p1", "p_user_id": guest.to_string(), "p_role": "viewer" }),
            )
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[tokio::test]
    async fn test_failure_injection_and_call_log() {
        let (store, _) = store();
        store.fail_next("select projects", RemoteError::Timeout);

        let query = Query::table("projects");
        assert_eq!(store.select(&query).await, Err(RemoteError::Timeout));
        assert_eq!(store.select(&query).await, Ok(Vec::new()));
        assert_eq!(store.count("select projects"), 2);
    }

    #[tokio::test]
    async fn test_signup_creates_profile_rows() {
        let (store, _) = store();
        let session = store.sign_up("ada@example.com", "pw").await.unwrap();

        let profiles = store.rows("user_profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["id"], session.user_id.to_string());
        assert_eq!(store.rows("user_settings")[0]["trd_prefers_user_pfp"], true);

        assert!(store.sign_in("ada@example.com", "wrong").await.is_err());
        assert_eq!(
            store.sign_in("ada@example.com", "pw").await.unwrap().user_id,
            session.user_id
        );
    }
}
