//! Projects page and project settings autosave

use crate::adapters::TableAdapter;
use crate::{decode, App, Result};
use autosave::AutosaveCoordinator;
use axiom_core::validate::require_non_empty;
use axiom_core::{EditableRecord, FieldSchema, Project, ProjectId, RemoteError, Visibility};
use remote::{Embed, Query};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Both lists shown on the projects page
#[derive(Debug, Clone, Default)]
pub struct ProjectOverview {
    pub owned: Vec<Project>,
    pub collaborative: Vec<Project>,
}

pub struct Projects<'a> {
    app: &'a App,
}

impl<'a> Projects<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Projects the current user owns
    pub async fn list_owned(&self) -> Result<Vec<Project>> {
        let me = self.app.require_user()?;
        let rows = self
            .app
            .store
            .select(&Query::table("projects").eq("user_id", me))
            .await?;
        Ok(rows.into_iter().map(decode).collect::<Result<_, _>>()?)
    }

    /// Projects the current user contributes to
    pub async fn list_collaborative(&self) -> Result<Vec<Project>> {
        let me = self.app.require_user()?;
        let query = Query::table("project_contributors")
            .select("project_id")
            .embed(Embed::new("projects", "*").on("project_id", "id"))
            .eq("user_id", me);
        let rows = self.app.store.select(&query).await?;

        let projects = rows
            .into_iter()
            .filter_map(|mut row| row.get_mut("projects").map(Value::take))
            // A contributor row whose project is not visible any more
            .filter(|project| !project.is_null())
            .map(decode)
            .collect::<Result<_, _>>()?;
        Ok(projects)
    }

    /// Owned and collaborative projects, fetched concurrently
    pub async fn overview(&self) -> Result<ProjectOverview> {
        let (owned, collaborative) =
            futures::try_join!(self.list_owned(), self.list_collaborative())?;
        Ok(ProjectOverview {
            owned,
            collaborative,
        })
    }

    /// Create a private project owned by the current user
    pub async fn create(&self, title: &str) -> Result<ProjectId> {
        let title = require_non_empty("title", title)?;
        let me = self.app.require_user()?;

        let row = self
            .app
            .store
            .insert(
                "projects",
                json!({
                    "title": title,
                    "user_id": me.to_string(),
                    "visibility": Visibility::Private.as_str(),
                }),
            )
            .await?;
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::Decode("created project has no id".to_string()))?
            .parse::<ProjectId>()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        info!(project = %id, title, "Project created");
        Ok(id)
    }

    pub async fn delete(&self, id: ProjectId) -> Result<()> {
        self.app.require_user()?;
        let removed = self
            .app
            .store
            .delete(&Query::table("projects").eq("id", id))
            .await?;
        if removed == 0 {
            return Err(RemoteError::NotFound(format!("project {id}")).into());
        }
        info!(project = %id, "Project deleted");
        Ok(())
    }

    /// Editable settings of one project
    pub async fn load_settings(&self, id: ProjectId) -> Result<EditableRecord> {
        let schema = FieldSchema::project();
        let query = Query::table(schema.table())
            .select(&schema.columns())
            .eq("id", id);
        let row = self.app.store.select_single(&query).await?;
        Ok(schema.record_from_row(&row))
    }

    /// Autosave coordinator for the project settings page
    ///
    /// The coordinator reports "Autosave is starting" until the settings
    /// have been fetched and loaded into it.
    pub async fn open_settings(&self, id: ProjectId) -> Result<AutosaveCoordinator> {
        let schema = FieldSchema::project();
        let adapter = TableAdapter::new(Arc::clone(&self.app.store), schema.clone());
        let coordinator = AutosaveCoordinator::new(
            id.into(),
            schema,
            Arc::new(adapter),
            self.app.options.project_autosave,
        );

        let baseline = self.load_settings(id).await?;
        debug!(project = %id, fields = baseline.len(), "Project settings loaded");
        coordinator.load(baseline);
        Ok(coordinator)
    }
}
