//! Axiom CLI - axiom command

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::{logging, system_config};
use owo_colors::OwoColorize;

mod cmd;
mod context;

/// Axiom - projects, contributors and profiles from the terminal
#[derive(Parser)]
#[command(name = "axiom")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        email: String,
        #[arg(long, env = "AXIOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        email: String,
        /// Public handle (a leading @ is ignored)
        username: String,
        /// Self-described role shown on the profile
        #[arg(long, default_value = "student")]
        role: String,
        #[arg(long, env = "AXIOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and clear local data
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Bypass the local cache
        #[arg(long)]
        refresh: bool,
    },
    /// Show operator notices (disabled features, banners)
    Notices,
    /// List, create and delete projects
    #[command(subcommand)]
    Projects(ProjectCommands),
    /// Manage the contributors of a project
    #[command(subcommand)]
    Contributors(ContributorCommands),
    /// View and change user settings
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// View, follow and edit profiles
    #[command(subcommand)]
    Profile(ProfileCommands),
    /// Manage system configuration
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Inspect or clear the local cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List owned and collaborative projects
    List,
    /// Create a private project
    Create { title: String },
    /// Delete a project
    Delete {
        id: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show a project's editable settings
    Show { id: String },
    /// Edit settings with autosave
    ///
    /// Without --set, reads `field=value` lines from stdin until EOF.
    Edit {
        id: String,
        /// Edits as field=value
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ContributorCommands {
    /// List contributors
    List { project: String },
    /// Add a user by username
    Add {
        project: String,
        username: String,
        #[arg(long, default_value = "viewer")]
        role: String,
    },
    /// Change a contributor's role
    Role {
        project: String,
        username: String,
        role: String,
    },
    /// Remove a contributor
    Remove { project: String, username: String },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show settings
    Show {
        /// Bypass the local cache
        #[arg(long)]
        refresh: bool,
    },
    /// Change settings with autosave (field=value, value is true/false)
    Set {
        #[arg(required = true, value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show a profile and your relation to it
    Show { username: String },
    /// Follow a user
    Follow { username: String },
    /// Stop following a user
    Unfollow { username: String },
    /// Edit your own profile
    Edit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "")]
        bio: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a single value
    Get { key: String },
    /// Set a value
    Set { key: String, value: String },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached entries
    Show,
    /// Remove every cached entry
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging follows the config file; fall back to defaults if it is broken
    let logging_config = system_config::load_file()
        .map(|c| c.logging)
        .unwrap_or_default();
    let _guard = match logging::init(&logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "warning:".yellow(), e);
            None
        }
    };

    if let Err(e) = run(cli.command).await {
        if let Some(app::AppError::NotLoggedIn) = e.downcast_ref::<app::AppError>() {
            eprintln!("{} Not logged in. Run 'axiom login' first.", "✗".red());
        } else {
            eprintln!("{} {:#}", "✗".red(), e);
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => cmd::auth::login(&email, &password).await,
        Commands::Signup {
            email,
            username,
            role,
            password,
        } => cmd::auth::signup(&email, &password, &username, &role).await,
        Commands::Logout => cmd::auth::logout().await,
        Commands::Whoami { refresh } => cmd::auth::whoami(refresh).await,
        Commands::Notices => cmd::auth::notices().await,
        Commands::Projects(command) => match command {
            ProjectCommands::List => cmd::projects::list().await,
            ProjectCommands::Create { title } => cmd::projects::create(&title).await,
            ProjectCommands::Delete { id, yes } => cmd::projects::delete(&id, yes).await,
            ProjectCommands::Show { id } => cmd::projects::show(&id).await,
            ProjectCommands::Edit { id, set } => cmd::edit::run(&id, set).await,
        },
        Commands::Contributors(command) => match command {
            ContributorCommands::List { project } => cmd::contributors::list(&project).await,
            ContributorCommands::Add {
                project,
                username,
                role,
            } => cmd::contributors::add(&project, &username, &role).await,
            ContributorCommands::Role {
                project,
                username,
                role,
            } => cmd::contributors::set_role(&project, &username, &role).await,
            ContributorCommands::Remove { project, username } => {
                cmd::contributors::remove(&project, &username).await
            }
        },
        Commands::Settings(command) => match command {
            SettingsCommands::Show { refresh } => cmd::settings::show(refresh).await,
            SettingsCommands::Set { assignments } => cmd::settings::set(&assignments).await,
        },
        Commands::Profile(command) => match command {
            ProfileCommands::Show { username } => cmd::profile::show(&username).await,
            ProfileCommands::Follow { username } => cmd::profile::follow(&username, true).await,
            ProfileCommands::Unfollow { username } => {
                cmd::profile::follow(&username, false).await
            }
            ProfileCommands::Edit {
                name,
                username,
                role,
                bio,
            } => cmd::profile::edit(name, username, role, bio).await,
        },
        Commands::Config(command) => match command {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
        Commands::Cache(command) => match command {
            CacheCommands::Show => cmd::cache::show().await,
            CacheCommands::Clear => cmd::cache::clear().await,
        },
    }
}
