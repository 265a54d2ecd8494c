//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::context::Context;
use crate::output::{self, OutputFormat};
use dochub_core::types::{UserId, UserRoleId};
use dochub_core::{AppError, AppResult};
use dochub_entity::{CreateUser, UpdateUser, User};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List all users
    List {
        /// Reload from the backend
        #[arg(long)]
        refresh: bool,
    },
    /// Show one user
    Show {
        /// User ID
        id: UserId,
    },
    /// Create a new user (password is prompted)
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,
        /// First name
        #[arg(long)]
        first_name: String,
        /// Last name
        #[arg(long)]
        last_name: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
    /// Update a user's profile
    Update {
        /// User ID
        id: UserId,
        /// New first name
        #[arg(long)]
        first_name: Option<String>,
        /// New last name
        #[arg(long)]
        last_name: Option<String>,
        /// Administrator flag
        #[arg(long)]
        admin: Option<bool>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    /// Delete a user
    Delete {
        /// User ID
        id: UserId,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Assign a role to a user
    AddRole {
        /// User ID
        id: UserId,
        /// User-role ID
        #[arg(short, long)]
        role: UserRoleId,
    },
    /// Withdraw a role from a user
    RemoveRole {
        /// User ID
        id: UserId,
        /// User-role ID
        #[arg(short, long)]
        role: UserRoleId,
    },
}

/// User display row
#[derive(Debug, Serialize, Tabled)]
pub struct UserRow {
    /// User ID
    id: u32,
    /// Username
    username: String,
    /// Full name
    name: String,
    /// Administrator
    admin: bool,
    /// Assigned roles
    roles: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            username: user.username.clone(),
            name: user.full_name(),
            admin: user.is_admin,
            roles: user
                .user_roles
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn prompt_password() -> AppResult<String> {
    dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))
}

/// Execute user commands
pub async fn execute(ctx: &Context, args: &UserArgs, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        UserCommand::List { refresh } => {
            let mut users = if *refresh {
                ctx.users.load_all().await?
            } else {
                ctx.users.list().await?
            };
            users.sort_by_key(|u| u.id);
            let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
        }
        UserCommand::Show { id } => {
            let user = ctx.users.get(*id).await?;
            output::print_item(&UserRow::from(&user), format);
        }
        UserCommand::Create {
            username,
            first_name,
            last_name,
            admin,
        } => {
            let password = prompt_password()?;
            let user = ctx
                .users
                .create(CreateUser {
                    username: username.clone(),
                    password,
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    is_admin: *admin,
                })
                .await?;
            output::print_success(&format!("User '{}' created (id: {})", user.username, user.id));
        }
        UserCommand::Update {
            id,
            first_name,
            last_name,
            admin,
            password,
        } => {
            let current = ctx.users.get(*id).await?;
            let mut req = UpdateUser::from_user(&current);
            if let Some(first_name) = first_name {
                req.first_name = first_name.clone();
            }
            if let Some(last_name) = last_name {
                req.last_name = last_name.clone();
            }
            if let Some(admin) = admin {
                req.is_admin = *admin;
            }
            if *password {
                req.password = Some(prompt_password()?);
            }

            let user = ctx.users.update(req).await?;
            if ctx.sessions.current_user().is_some_and(|me| me.id == user.id) {
                ctx.sessions.update_profile(user.clone()).await?;
            }
            output::print_success(&format!("User '{}' updated", user.username));
        }
        UserCommand::Delete { id, force } => {
            let user = ctx.users.get(*id).await?;
            if !super::confirm(&format!("Delete user '{}'?", user.username), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.users.delete(*id).await?;
            output::print_success(&format!("User '{}' deleted", user.username));
        }
        UserCommand::AddRole { id, role } => {
            let role = ctx.roles.get(*role).await?;
            let user = ctx.users.add_role(*id, &role).await?;
            output::print_success(&format!(
                "Role '{}' assigned to '{}'",
                role.name, user.username
            ));
        }
        UserCommand::RemoveRole { id, role } => {
            let role = ctx.roles.get(*role).await?;
            let user = ctx.users.remove_role(*id, &role).await?;
            output::print_success(&format!(
                "Role '{}' withdrawn from '{}'",
                role.name, user.username
            ));
        }
    }

    Ok(())
}
