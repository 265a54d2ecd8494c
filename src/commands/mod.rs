//! CLI command definitions and dispatch.

pub mod access;
pub mod file;
pub mod folder;
pub mod recent;
pub mod role;
pub mod session;
pub mod user;

use clap::{Parser, Subcommand};

use crate::context::Context;
use crate::output::OutputFormat;
use dochub_core::AppResult;
use dochub_core::config::AppConfig;

/// DocHub: command-line client for the document store
#[derive(Debug, Parser)]
#[command(name = "dochub", version, about, long_about = None)]
pub struct Cli {
    /// Path to an additional configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login(session::LoginArgs),
    /// Sign out and clear the persisted session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Folder browsing and management
    Folder(folder::FolderArgs),
    /// File upload, download and management
    File(file::FileArgs),
    /// Recently updated folders and files
    Recent(recent::RecentArgs),
    /// Effective access levels and access-role bindings
    Access(access::AccessArgs),
    /// User management
    Users(user::UserArgs),
    /// User-role management
    Roles(role::RoleArgs),
}

impl Cli {
    /// Load configuration for this invocation.
    pub fn load_config(&self) -> AppResult<AppConfig> {
        AppConfig::load(self.config.as_deref())
    }

    /// Execute the CLI command
    pub async fn execute(&self, ctx: &Context) -> AppResult<()> {
        match &self.command {
            Commands::Login(args) => session::login(ctx, args, self.format).await,
            Commands::Logout => session::logout(ctx).await,
            Commands::Whoami => session::whoami(ctx, self.format),
            Commands::Folder(args) => folder::execute(ctx, args, self.format).await,
            Commands::File(args) => file::execute(ctx, args).await,
            Commands::Recent(args) => recent::execute(ctx, args, self.format).await,
            Commands::Access(args) => access::execute(ctx, args, self.format).await,
            Commands::Users(args) => user::execute(ctx, args, self.format).await,
            Commands::Roles(args) => role::execute(ctx, args, self.format).await,
        }
    }
}

/// Ask for confirmation unless `force` is set.
pub fn confirm(prompt: &str, force: bool) -> AppResult<bool> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| dochub_core::AppError::internal(format!("Input error: {}", e)))
}

/// Format a timestamp for table output.
pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
