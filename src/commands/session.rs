//! Login, logout and whoami.

use clap::Args;

use crate::commands::user::UserRow;
use crate::context::Context;
use crate::output::{self, OutputFormat};
use dochub_core::{AppError, AppResult};

/// Arguments for `login`
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username (prompted when omitted)
    #[arg(short, long)]
    pub username: Option<String>,
    /// Password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Sign in and persist the session.
pub async fn login(ctx: &Context, args: &LoginArgs, format: OutputFormat) -> AppResult<()> {
    let username = match &args.username {
        Some(username) => username.clone(),
        None => dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };
    let password = match &args.password {
        Some(password) => password.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
    };

    let user = ctx.sessions.login(&username, &password).await?;
    output::print_success(&format!("Logged in as '{}'", user.username));
    if format == OutputFormat::Json {
        output::print_item(&UserRow::from(&user), format);
    }
    Ok(())
}

/// Sign out.
pub async fn logout(ctx: &Context) -> AppResult<()> {
    if !ctx.sessions.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    ctx.sessions.logout().await?;
    output::print_success("Logged out");
    Ok(())
}

/// Show the signed-in user.
pub fn whoami(ctx: &Context, format: OutputFormat) -> AppResult<()> {
    let user = ctx.require_user()?;
    match format {
        OutputFormat::Json => output::print_item(&UserRow::from(&user), format),
        OutputFormat::Table => {
            output::print_kv("ID", &user.id.to_string());
            output::print_kv("Username", &user.username);
            output::print_kv("Name", &user.full_name());
            output::print_kv("Admin", if user.is_admin { "yes" } else { "no" });
            let roles: Vec<&str> = user.user_roles.iter().map(|r| r.name.as_str()).collect();
            output::print_kv("Roles", &roles.join(", "));
            output::print_kv("Session file", &ctx.config.session.path);
        }
    }
    Ok(())
}
