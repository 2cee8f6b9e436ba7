//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use anyhow::{Context, Result};
use cli_lib::system_config::{self, KEYS};
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load_file()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}", "Location".dimmed(), config_path.display().dimmed());

    let mut section = "";
    for key in KEYS {
        let (prefix, name) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            println!("\n{}", format!("[{}]", prefix).yellow());
            section = prefix;
        }
        let mut value = config.get(key)?;
        if *key == "backend.anon_key" && !value.is_empty() {
            value = "********".to_string();
        }
        println!("  {} = {}", name.cyan(), value);
    }

    for (var, present) in [
        ("AXIOM_URL", std::env::var_os("AXIOM_URL").is_some()),
        ("AXIOM_ANON_KEY", std::env::var_os("AXIOM_ANON_KEY").is_some()),
    ] {
        if present {
            println!("\n{}", format!("{} overrides the file value", var).yellow());
        }
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  backend.request_timeout_ms: 1000-120000");
    println!("  autosave.project_quiet_ms, autosave.settings_quiet_ms: 100-60000");
    println!("  autosave.saved_display_ms: 0-60000 (0 = keep until next edit)");
    println!("  signup.max_attempts: 1-50");
    println!("  logging.level: trace, debug, info, warn, error");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load_file()?;
    println!("{}", config.get(key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load_file()?;
    config.set(key, value)?;

    // Validate before saving
    config.validate()
        .context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    let example = system_config::example_config();
    println!("{}", example);
    Ok(())
}
