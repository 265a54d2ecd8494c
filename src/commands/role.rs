//! User-role management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::context::Context;
use crate::output::{self, OutputFormat};
use dochub_core::AppResult;
use dochub_core::types::UserRoleId;
use dochub_entity::{CreateUserRole, UpdateUserRole, UserRole};

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RoleArgs {
    /// Role subcommand
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// List all user roles
    List {
        /// Reload from the backend
        #[arg(long)]
        refresh: bool,
    },
    /// Show one role and its folder bindings
    Show {
        /// User-role ID
        id: UserRoleId,
    },
    /// Create a user role
    Create {
        /// Role name
        #[arg(short, long)]
        name: String,
    },
    /// Rename a user role
    Rename {
        /// User-role ID
        id: UserRoleId,
        /// New name
        #[arg(short, long)]
        name: String,
    },
    /// Delete a user role
    Delete {
        /// User-role ID
        id: UserRoleId,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Role display row
#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    /// Role ID
    id: u32,
    /// Name
    name: String,
    /// Folder bindings
    bindings: usize,
}

impl From<&UserRole> for RoleRow {
    fn from(role: &UserRole) -> Self {
        Self {
            id: role.id.get(),
            name: role.name.clone(),
            bindings: role.access_roles.len(),
        }
    }
}

/// Binding display row
#[derive(Debug, Serialize, Tabled)]
struct RoleBindingRow {
    /// Binding ID
    id: u32,
    /// Folder ID
    folder: u32,
    /// Level
    level: String,
}

/// Execute role commands
pub async fn execute(ctx: &Context, args: &RoleArgs, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        RoleCommand::List { refresh } => {
            let mut roles = if *refresh {
                ctx.roles.load_all().await?
            } else {
                ctx.roles.list().await?
            };
            roles.sort_by(|a, b| a.name.cmp(&b.name));
            let rows: Vec<RoleRow> = roles.iter().map(RoleRow::from).collect();
            output::print_list(&rows, format);
        }
        RoleCommand::Show { id } => {
            let role = ctx.roles.get(*id).await?;
            let rows: Vec<RoleBindingRow> = role
                .access_roles
                .iter()
                .map(|b| RoleBindingRow {
                    id: b.id.get(),
                    folder: b.folder_id.get(),
                    level: b.access_level.to_string(),
                })
                .collect();
            if format == OutputFormat::Table {
                output::print_kv("Role", &format!("{} ({})", role.name, role.id));
            }
            output::print_list(&rows, format);
        }
        RoleCommand::Create { name } => {
            let role = ctx
                .roles
                .create(CreateUserRole { name: name.clone() })
                .await?;
            output::print_success(&format!("Role '{}' created (id: {})", role.name, role.id));
        }
        RoleCommand::Rename { id, name } => {
            ctx.roles.get(*id).await?;
            let role = ctx
                .roles
                .update(UpdateUserRole {
                    id: *id,
                    name: name.clone(),
                })
                .await?;
            output::print_success(&format!("Role {} renamed to '{}'", role.id, role.name));
        }
        RoleCommand::Delete { id, force } => {
            let role = ctx.roles.get(*id).await?;
            if !super::confirm(&format!("Delete role '{}'?", role.name), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.roles.delete(*id).await?;
            output::print_success(&format!("Role '{}' deleted", role.name));
        }
    }

    Ok(())
}
