//! Local cache inspection

use crate::context;
use anyhow::Result;
use cli_lib::util;
use owo_colors::OwoColorize;

pub async fn show() -> Result<()> {
    let cache = context::open_cache()?;
    let entries = cache.entries()?;

    if entries.is_empty() {
        println!("{}", "Cache is empty".dimmed());
        return Ok(());
    }
    for entry in entries {
        println!(
            "  {:<16} {:>10}  {}",
            entry.key.cyan(),
            util::format_entry_size(entry.size),
            util::format_age(entry.stored_at).dimmed()
        );
    }
    Ok(())
}

pub async fn clear() -> Result<()> {
    let cache = context::open_cache()?;
    let removed = cache.clear()?;
    println!("{} Removed {} cached entries", "✓".green(), removed);
    Ok(())
}
