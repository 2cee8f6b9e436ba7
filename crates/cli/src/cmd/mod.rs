//! CLI command implementations

pub mod auth;
pub mod cache;
pub mod config;
pub mod contributors;
pub mod edit;
pub mod profile;
pub mod projects;
pub mod settings;

use crate::context;
use anyhow::{Context, Result};
use app::App;
use axiom_core::ProjectId;
use cli_lib::system_config;

/// Load the config and connect
pub(crate) fn connect() -> Result<App> {
    let config = system_config::load()?;
    context::connect(&config)
}

pub(crate) fn parse_project(id: &str) -> Result<ProjectId> {
    id.parse()
        .with_context(|| format!("Invalid project id '{}'", id))
}
