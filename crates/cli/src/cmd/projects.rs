//! Projects page

use super::{connect, parse_project};
use anyhow::{Context, Result};
use axiom_core::Project;
use cli_lib::util;
use owo_colors::OwoColorize;
use std::io::Write;

pub async fn list() -> Result<()> {
    let app = connect()?;
    let overview = app
        .projects()
        .overview()
        .await
        .context("Failed to load projects")?;

    println!("{}", "Your projects".bold());
    print_projects(&overview.owned);
    println!();
    println!("{}", "Collaborations".bold());
    print_projects(&overview.collaborative);
    Ok(())
}

fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    for project in projects {
        let updated = project
            .updated_at
            .map(util::format_age)
            .unwrap_or_default();
        println!(
            "  {} {} {} {}",
            project.id.to_string().yellow(),
            project.title,
            format!("[{}]", project.visibility).cyan(),
            updated.dimmed()
        );
    }
}

pub async fn create(title: &str) -> Result<()> {
    let app = connect()?;
    let id = app.projects().create(title).await?;
    println!("{} Created project {}", "✓".green(), id.to_string().yellow());
    Ok(())
}

pub async fn delete(id: &str, yes: bool) -> Result<()> {
    let id = parse_project(id)?;
    let app = connect()?;

    if !yes {
        print!("Delete project {}? This cannot be undone. [y/N] ", id);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted");
            return Ok(());
        }
    }

    app.projects().delete(id).await?;
    println!("{} Deleted project {}", "✓".green(), id.to_string().yellow());
    Ok(())
}

pub async fn show(id: &str) -> Result<()> {
    let id = parse_project(id)?;
    let app = connect()?;
    let record = app.projects().load_settings(id).await?;

    println!("{} {}", "Project".bold(), id.to_string().yellow());
    for (field, value) in record.iter() {
        println!("  {} = {}", field.cyan(), value);
    }
    Ok(())
}
