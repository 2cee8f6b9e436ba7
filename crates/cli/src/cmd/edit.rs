//! Project settings editing with autosave
//!
//! Each `field=value` goes through the coordinator exactly like a keystroke on
//! the settings page. A spinner mirrors the autosave status until every edit
//! is written.

use super::{connect, parse_project};
use anyhow::{Context, Result};
use autosave::{AutosaveCoordinator, AutosaveState, EditOutcome};
use cli_lib::util;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(id: &str, assignments: Vec<String>) -> Result<()> {
    let id = parse_project(id)?;
    let app = connect()?;

    // 1. Load the settings into a coordinator
    let coordinator = app
        .projects()
        .open_settings(id)
        .await
        .context("Failed to load project settings")?;

    // 2. Mirror the status on a spinner
    let spinner = status_spinner(&coordinator)?;

    // 3. Feed edits
    if assignments.is_empty() {
        spinner.println(format!(
            "{}",
            "Enter field=value lines; end with Ctrl-D".dimmed()
        ));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            apply(&coordinator, &spinner, &line);
        }
    } else {
        for assignment in &assignments {
            apply(&coordinator, &spinner, assignment);
        }
    }

    // 4. Write whatever is still pending
    coordinator.flush_now().await;
    finish(&coordinator, spinner)
}

/// Apply one `field=value` line
pub(crate) fn apply(coordinator: &AutosaveCoordinator, spinner: &ProgressBar, line: &str) {
    let (field, value) = match util::parse_assignment(coordinator.schema(), line) {
        Ok(parsed) => parsed,
        Err(e) => {
            spinner.println(format!("{} {:#}", "✗".red(), e));
            return;
        }
    };
    if let EditOutcome::Rejected(reason) = coordinator.on_field_edit(&field, value) {
        spinner.println(format!("{} {}", "✗".red(), reason));
    }
}

/// Spinner that follows the coordinator's status channel
pub(crate) fn status_spinner(coordinator: &AutosaveCoordinator) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(util::status_line(&coordinator.status()));

    let mut status = coordinator.subscribe();
    let follower = spinner.clone();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let line = util::status_line(&status.borrow_and_update());
            follower.set_message(line);
        }
    });
    Ok(spinner)
}

/// Print the final status; an unsaved edit is an error exit
pub(crate) fn finish(coordinator: &AutosaveCoordinator, spinner: ProgressBar) -> Result<()> {
    let status = coordinator.status();
    spinner.finish_and_clear();
    println!("{}", util::status_line(&status));

    if status.state == AutosaveState::Error {
        let error = coordinator
            .last_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| status.message.clone());
        anyhow::bail!("Changes were not saved: {}", error);
    }
    Ok(())
}
