//! Profiles

use super::connect;
use anyhow::Result;
use app::profiles::ProfileEdit;
use axiom_core::Relation;
use owo_colors::OwoColorize;

pub async fn show(username: &str) -> Result<()> {
    let app = connect()?;
    let profile = app.profiles().get_by_username(username).await?;
    let relation = app.profiles().relation(&profile).await?;

    println!("{}", profile.display_name().bold());
    if let Some(username) = &profile.username {
        println!("  @{}", username.dimmed());
    }
    if let Some(role) = profile.role.as_deref().filter(|r| !r.is_empty()) {
        println!("  {}", role.cyan());
    }
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
        println!();
        println!("  {}", bio);
    }
    println!();
    let hint = match relation {
        Relation::Edit => "This is you. Edit with 'axiom profile edit'.",
        Relation::Follow => "Follow with 'axiom profile follow'.",
        Relation::Unfollow => "You follow this user.",
    };
    println!("{}", hint.dimmed());
    Ok(())
}

pub async fn follow(username: &str, follow: bool) -> Result<()> {
    let app = connect()?;
    let profile = app.profiles().get_by_username(username).await?;

    let relation = if follow {
        app.profiles().follow(profile.id).await?
    } else {
        app.profiles().unfollow(profile.id).await?
    };
    match relation {
        Relation::Edit => println!("{}", "You cannot follow yourself".yellow()),
        Relation::Unfollow => println!("{} Following {}", "✓".green(), profile.display_name().cyan()),
        Relation::Follow => println!("{} Unfollowed {}", "✓".green(), profile.display_name().cyan()),
    }
    Ok(())
}

pub async fn edit(name: String, username: String, role: String, bio: String) -> Result<()> {
    let app = connect()?;
    let edit = ProfileEdit {
        name,
        username,
        role,
        bio,
    };
    let profile = app.profiles().update_profile(&edit).await?;
    println!("{} Profile updated: {}", "✓".green(), profile.display_name().cyan());
    Ok(())
}
