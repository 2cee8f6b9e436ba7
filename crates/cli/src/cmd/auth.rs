//! Login, signup, logout and the current user

use super::connect;
use anyhow::{Context, Result};
use app::auth::SignupForm;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

pub async fn login(email: &str, password: &str) -> Result<()> {
    let app = connect()?;
    let session = app
        .auth()
        .login(email, password)
        .await
        .context("Login failed")?;

    println!("{} Logged in as {}", "✓".green(), session.email.cyan());
    let next = app.auth().last_page()?;
    if next != "/" {
        println!("  {}", format!("Last page: {}", next).dimmed());
    }
    Ok(())
}

pub async fn signup(email: &str, password: &str, username: &str, role: &str) -> Result<()> {
    let app = connect()?;
    let form = SignupForm {
        email: email.to_string(),
        password: password.to_string(),
        username: username.to_string(),
        role: role.to_string(),
    };

    // The profile row appears shortly after the account; show progress while waiting
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Creating account…");

    let result = app.auth().signup(&form).await;
    spinner.finish_and_clear();
    let session = result.context("Signup failed")?;

    println!(
        "{} Account created for {} ({})",
        "✓".green(),
        session.email.cyan(),
        format!("@{}", username.trim_start_matches('@')).dimmed()
    );
    Ok(())
}

pub async fn logout() -> Result<()> {
    let app = connect()?;
    app.auth().logout().await?;
    println!("{} Logged out", "✓".green());
    Ok(())
}

pub async fn whoami(refresh: bool) -> Result<()> {
    let app = connect()?;
    let profile = app.profiles().cached_profile(refresh).await?;

    println!("{}", profile.display_name().bold());
    if let Some(username) = &profile.username {
        println!("  {}: @{}", "Username".dimmed(), username);
    }
    if let Some(session) = app.session().get() {
        println!("  {}: {}", "Email".dimmed(), session.email);
    }
    if let Some(role) = &profile.role {
        println!("  {}: {}", "Role".dimmed(), role);
    }
    println!("  {}: {}", "Id".dimmed(), profile.id.to_string().dimmed());
    Ok(())
}

pub async fn notices() -> Result<()> {
    let app = connect()?;
    let notices = app.auth().notices().await?;

    let state = |enabled: bool| {
        if enabled {
            "enabled".green().to_string()
        } else {
            "disabled".red().to_string()
        }
    };
    println!("Signup: {}", state(notices.signup_enabled));
    println!("Login:  {}", state(notices.login_enabled));
    if let Some(banner) = notices.banner {
        println!();
        println!("{}", banner.title.bold().red());
        println!("{}", banner.message);
    }
    Ok(())
}
