//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use autosave::{AutosaveState, AutosaveStatus};
use axiom_core::{FieldKind, FieldSchema, FieldValue};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

/// Compact age of a timestamp: "just now", "5m ago", "3h ago", "2d ago"
///
/// Server timestamps slightly ahead of the local clock count as "just now".
pub fn format_age(at: DateTime<Utc>) -> String {
    let age = Utc::now() - at;
    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}

/// Size of a cache entry; entries are small records, so whole bytes up to 10 KiB
pub fn format_entry_size(bytes: usize) -> String {
    if bytes < 10 * 1024 {
        format!("{} B", bytes)
    } else {
        format!("{} KiB", bytes / 1024)
    }
}

/// First eight characters of an id
pub fn short_id(id: &impl ToString) -> String {
    id.to_string().chars().take(8).collect()
}

/// Autosave status as one colored line
pub fn status_line(status: &AutosaveStatus) -> String {
    match status.state {
        AutosaveState::Idle => status.message.dimmed().to_string(),
        AutosaveState::Saving => status.message.yellow().to_string(),
        AutosaveState::Saved => format!("{} {}", "✓".green(), status.message.green()),
        AutosaveState::Error => format!("{} {}", "✗".red(), status.message.red()),
    }
}

/// Parse `field=value` into an edit typed by the schema
///
/// Unknown fields are passed through as text so the coordinator can reject
/// them itself.
pub fn parse_assignment(schema: &FieldSchema, input: &str) -> Result<(String, FieldValue)> {
    let (field, value) = input
        .split_once('=')
        .with_context(|| format!("Expected field=value, got '{}'", input))?;
    let field = field.trim().to_string();
    let value = value.trim();

    let value = match schema.kind(&field) {
        Some(FieldKind::Flag) => FieldValue::Flag(parse_flag(value)?),
        _ => FieldValue::Text(value.to_string()),
    };
    Ok((field, value))
}

/// Parse on/off style booleans
pub fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("Invalid value '{}': expected true or false", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry_size() {
        assert_eq!(format_entry_size(0), "0 B");
        assert_eq!(format_entry_size(412), "412 B");
        assert_eq!(format_entry_size(10 * 1024 - 1), "10239 B");
        assert_eq!(format_entry_size(48 * 1024 + 100), "48 KiB");
    }

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(now), "just now");
        assert_eq!(format_age(now + chrono::Duration::seconds(30)), "just now");
        assert_eq!(format_age(now - chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(now - chrono::Duration::hours(3)), "3h ago");
        assert_eq!(format_age(now - chrono::Duration::days(9)), "9d ago");
    }

    #[test]
    fn test_parse_assignment() -> Result<()> {
        let project = FieldSchema::project();
        assert_eq!(
            parse_assignment(&project, "title = Atlas = II")?,
            ("title".to_string(), FieldValue::Text("Atlas = II".into()))
        );
        assert_eq!(
            parse_assignment(&project, "owner=x")?,
            ("owner".to_string(), FieldValue::Text("x".into()))
        );
        assert!(parse_assignment(&project, "title").is_err());

        let settings = FieldSchema::user_settings();
        assert_eq!(
            parse_assignment(&settings, "trd_prefers_show_email=on")?,
            ("trd_prefers_show_email".to_string(), FieldValue::Flag(true))
        );
        assert!(parse_assignment(&settings, "trd_prefers_show_email=maybe").is_err());
        Ok(())
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id(&"5f0c7c1e-2b7a-4f55"), "5f0c7c1e");
    }
}
