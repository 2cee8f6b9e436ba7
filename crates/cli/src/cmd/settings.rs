//! User settings

use super::connect;
use super::edit::{apply, finish, status_spinner};
use anyhow::{Context, Result};
use axiom_core::UserSettings;
use owo_colors::OwoColorize;

pub async fn show(refresh: bool) -> Result<()> {
    let app = connect()?;
    let settings = app
        .settings()
        .load(refresh)
        .await
        .context("Failed to load settings")?;
    print_settings(&settings);
    Ok(())
}

pub async fn set(assignments: &[String]) -> Result<()> {
    let app = connect()?;
    let coordinator = app
        .settings()
        .autosave()
        .await
        .context("Failed to load settings")?;

    let spinner = status_spinner(&coordinator)?;
    for assignment in assignments {
        apply(&coordinator, &spinner, assignment);
    }
    coordinator.flush_now().await;
    finish(&coordinator, spinner)
}

fn print_settings(settings: &UserSettings) {
    let rows = [
        ("trd_prefers_notification_ping", settings.trd_prefers_notification_ping),
        ("trd_prefers_notification_badge", settings.trd_prefers_notification_badge),
        ("trd_prefers_name_display", settings.trd_prefers_name_display),
        ("trd_prefers_show_email", settings.trd_prefers_show_email),
        ("trd_prefers_user_pfp", settings.trd_prefers_user_pfp),
    ];
    println!("{}", "Settings".bold());
    for (name, on) in rows {
        let value = if on { "on".green().to_string() } else { "off".dimmed().to_string() };
        println!("  {:<32} {}", name.cyan(), value);
    }
}
