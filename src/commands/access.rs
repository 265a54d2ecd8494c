//! Access-level CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::context::Context;
use crate::output::{self, OutputFormat};
use dochub_core::error::codes;
use dochub_core::types::{AccessRoleId, FolderId, UserRoleId};
use dochub_core::{AppError, AppResult};
use dochub_entity::{AccessLevel, CreateAccessRole};

/// Arguments for access commands
#[derive(Debug, Args)]
pub struct AccessArgs {
    /// Access subcommand
    #[command(subcommand)]
    pub command: AccessCommand,
}

/// Access subcommands
#[derive(Debug, Subcommand)]
pub enum AccessCommand {
    /// Show the effective level on a folder and the bindings it inherits
    Show {
        /// Folder ID
        folder: FolderId,
        /// Resolve for a single role instead of the signed-in user
        #[arg(short, long)]
        role: Option<UserRoleId>,
    },
    /// Bind an access level to a role on a folder
    Grant {
        /// Folder ID
        #[arg(short, long)]
        folder: FolderId,
        /// User-role ID
        #[arg(short, long)]
        role: UserRoleId,
        /// Level: none, viewer, uploader, publisher (or 1-4)
        #[arg(short, long)]
        level: AccessLevel,
    },
    /// Remove an access-role binding
    Revoke {
        /// Access-role binding ID
        id: AccessRoleId,
        /// User-role owning the binding
        #[arg(short, long)]
        role: UserRoleId,
    },
}

/// Binding display row
#[derive(Debug, Serialize, Tabled)]
struct BindingRow {
    /// Binding ID
    id: u32,
    /// Folder the binding is attached to
    folder: String,
    /// Role
    role: String,
    /// Level
    level: String,
}

#[derive(Debug, Serialize)]
struct AccessView {
    folder: FolderId,
    effective: String,
    bindings: Vec<BindingRow>,
}

/// Execute access commands
pub async fn execute(ctx: &Context, args: &AccessArgs, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        AccessCommand::Show { folder, role } => {
            let effective = match role {
                Some(role) => ctx.access.resolve(*role, *folder).await?,
                None => ctx.access.annotate(&ctx.require_user()?, *folder).await?,
            };

            let chain = ctx.breadcrumbs.chain(*folder).await?;
            let bindings: Vec<BindingRow> = chain
                .iter()
                .flat_map(|f| f.access_roles.iter().map(move |b| (f, b)))
                .filter(|(_, b)| role.is_none_or(|r| b.user_role_id == r))
                .map(|(f, b)| BindingRow {
                    id: b.id.get(),
                    folder: format!("{} ({})", f.name, f.id),
                    role: ctx
                        .state
                        .user_roles
                        .get_by_id(b.user_role_id)
                        .map(|r| r.name)
                        .unwrap_or_else(|| b.user_role_id.to_string()),
                    level: b.access_level.to_string(),
                })
                .collect();

            match format {
                OutputFormat::Json => output::print_json(&AccessView {
                    folder: *folder,
                    effective: effective.to_string(),
                    bindings,
                }),
                OutputFormat::Table => {
                    output::print_kv("Effective level", &effective.to_string());
                    output::print_list(&bindings, format);
                }
            }
        }
        AccessCommand::Grant {
            folder,
            role,
            level,
        } => {
            let binding = ctx
                .roles
                .add_access_role(CreateAccessRole {
                    folder_id: *folder,
                    user_role_id: *role,
                    access_level: *level,
                })
                .await?;
            output::print_success(&format!(
                "Granted {} on folder {} to role {} (binding {})",
                binding.access_level, binding.folder_id, binding.user_role_id, binding.id
            ));
        }
        AccessCommand::Revoke { id, role } => {
            let owner = ctx.roles.get(*role).await?;
            let binding = owner
                .access_roles
                .iter()
                .find(|b| b.id == *id)
                .copied()
                .ok_or_else(|| AppError::not_found(codes::ACCESS_ROLE_NOT_FOUND))?;
            ctx.roles.remove_access_role(&binding).await?;
            output::print_success(&format!("Binding {} removed from role '{}'", id, owner.name));
        }
    }

    Ok(())
}
