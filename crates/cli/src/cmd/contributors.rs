//! Contributor management

use super::{connect, parse_project};
use anyhow::{Context, Result};
use app::contributors::RosterChange;
use app::App;
use axiom_core::validate::parse_role;
use axiom_core::UserId;
use owo_colors::OwoColorize;

pub async fn list(project: &str) -> Result<()> {
    let project = parse_project(project)?;
    let app = connect()?;
    let roster = app
        .contributors()
        .list(project)
        .await
        .context("Failed to load contributors")?;

    if roster.is_empty() {
        println!("{}", "No contributors yet".dimmed());
        return Ok(());
    }
    for contributor in roster.entries() {
        println!(
            "  {:<24} {}  {}",
            contributor.profile.name,
            contributor.role.to_string().cyan(),
            contributor.user_id.to_string().dimmed()
        );
    }
    Ok(())
}

pub async fn add(project: &str, username: &str, role: &str) -> Result<()> {
    let project = parse_project(project)?;
    let app = connect()?;
    let mut roster = app.contributors().list(project).await?;

    let added = app
        .contributors()
        .add(&mut roster, username, role)
        .await
        .map_err(permission_hint)?;
    println!(
        "{} Added {} as {}",
        "✓".green(),
        added.profile.name.cyan(),
        added.role
    );
    Ok(())
}

pub async fn set_role(project: &str, username: &str, role: &str) -> Result<()> {
    let project = parse_project(project)?;
    let role = parse_role(role)?;
    let app = connect()?;
    let user = resolve(&app, username).await?;
    let mut roster = app.contributors().list(project).await?;

    let change = app
        .contributors()
        .update_role(&mut roster, user, role)
        .await
        .map_err(permission_hint)?;
    report(change, &format!("{} is now {}", username, role));
    Ok(())
}

pub async fn remove(project: &str, username: &str) -> Result<()> {
    let project = parse_project(project)?;
    let app = connect()?;
    let user = resolve(&app, username).await?;
    let mut roster = app.contributors().list(project).await?;

    let change = app
        .contributors()
        .remove(&mut roster, user)
        .await
        .map_err(permission_hint)?;
    report(change, &format!("Removed {}", username));
    Ok(())
}

async fn resolve(app: &App, username: &str) -> Result<UserId> {
    let profile = app.profiles().get_by_username(username).await?;
    Ok(profile.id)
}

fn report(change: RosterChange, applied: &str) {
    match change {
        RosterChange::Applied => println!("{} {}", "✓".green(), applied),
        RosterChange::AlreadyGone => println!(
            "{} {}",
            "!".yellow(),
            "That user is no longer a contributor".yellow()
        ),
    }
}

fn permission_hint(err: app::AppError) -> anyhow::Error {
    if err.is_permission_denied() {
        anyhow::Error::new(err)
            .context("Only the project owner can manage contributors. Request access from the owner.")
    } else {
        err.into()
    }
}
