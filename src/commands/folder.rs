//! Folder CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::context::Context;
use crate::output::{self, OutputFormat};
use dochub_core::error::codes;
use dochub_core::types::FolderId;
use dochub_core::{AppError, AppResult};
use dochub_entity::{CreateFolder, Folder, PendingIntent, UpdateFolder};
use dochub_service::Listing;

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Show a folder's path, access level and contents
    Show {
        /// Folder ID
        #[arg(default_value = "1")]
        id: FolderId,
        /// Re-fetch even if cached
        #[arg(long)]
        refresh: bool,
    },
    /// Create a sub-folder
    Create {
        /// Parent folder ID
        #[arg(short, long)]
        parent: FolderId,
        /// Folder name
        #[arg(short, long)]
        name: String,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        id: FolderId,
        /// New name
        #[arg(short, long)]
        name: String,
    },
    /// Move a folder under another parent
    Move {
        /// Folder ID
        id: FolderId,
        /// New parent folder ID
        #[arg(short, long)]
        to: FolderId,
    },
    /// Delete an empty folder
    Delete {
        /// Folder ID
        id: FolderId,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// One line of a folder listing
#[derive(Debug, Serialize, Tabled)]
pub struct EntryRow {
    /// Folder or file
    kind: &'static str,
    /// ID
    id: u32,
    /// Name
    name: String,
    /// Published (files only)
    published: String,
    /// Last update
    updated: String,
}

/// A folder with its path and contents
#[derive(Debug, Serialize)]
struct FolderView {
    id: FolderId,
    name: String,
    path: String,
    access_level: String,
    entries: Vec<EntryRow>,
}

/// Rows for a listing, folders first.
pub fn entry_rows(listing: &Listing) -> Vec<EntryRow> {
    let folders = listing.folders.iter().map(|f| EntryRow {
        kind: "folder",
        id: f.id.get(),
        name: f.name.clone(),
        published: String::new(),
        updated: super::timestamp(f.updated_at),
    });
    let files = listing.files.iter().map(|f| EntryRow {
        kind: "file",
        id: f.id.get(),
        name: f.name.clone(),
        published: if f.is_published { "yes" } else { "no" }.to_string(),
        updated: super::timestamp(f.updated_at),
    });
    folders.chain(files).collect()
}

/// Ensure a folder is cached and return it.
pub async fn resident_folder(ctx: &Context, id: FolderId) -> AppResult<Folder> {
    ctx.engine.fetch_folder(id).await?;
    ctx.state
        .folders
        .get_by_id(id)
        .ok_or_else(|| AppError::not_found(codes::FOLDER_NOT_FOUND))
}

/// Execute folder commands
pub async fn execute(ctx: &Context, args: &FolderArgs, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        FolderCommand::Show { id, refresh } => {
            if *refresh {
                ctx.engine.refresh_folder(*id).await?;
            }
            let listing = ctx.engine.open(*id).await?;
            let path = ctx.breadcrumbs.resolve(*id).await?;
            let level = match ctx.sessions.current_user() {
                Some(user) => ctx.access.annotate(&user, *id).await?,
                None => listing.folder.access_level,
            };
            let entries = entry_rows(&listing);

            match format {
                OutputFormat::Json => output::print_json(&FolderView {
                    id: *id,
                    name: listing.folder.name.clone(),
                    path: path.to_string(),
                    access_level: level.to_string(),
                    entries,
                }),
                OutputFormat::Table => {
                    output::print_kv("Path", &path.to_string());
                    output::print_kv("Access", &level.to_string());
                    output::print_list(&entries, format);
                }
            }
        }
        FolderCommand::Create { parent, name } => {
            let user = ctx.require_user()?;
            resident_folder(ctx, *parent).await?;
            ctx.state
                .set_intent(PendingIntent::CreateFolder { parent: *parent });
            let folder = ctx
                .engine
                .create_folder(CreateFolder {
                    name: name.clone(),
                    parent_folder_id: *parent,
                    last_editor_id: user.id,
                })
                .await?;
            output::print_success(&format!("Folder '{}' created (id: {})", folder.name, folder.id));
        }
        FolderCommand::Rename { id, name } => {
            let user = ctx.require_user()?;
            let current = resident_folder(ctx, *id).await?;
            ctx.state.set_intent(PendingIntent::EditFolder { id: *id });
            let folder = ctx
                .engine
                .update_folder(UpdateFolder {
                    id: *id,
                    name: name.clone(),
                    parent_folder_id: current.parent_folder_id,
                    last_editor_id: user.id,
                })
                .await?;
            output::print_success(&format!("Folder {} renamed to '{}'", folder.id, folder.name));
        }
        FolderCommand::Move { id, to } => {
            let user = ctx.require_user()?;
            let current = resident_folder(ctx, *id).await?;
            resident_folder(ctx, *to).await?;
            ctx.state.set_intent(PendingIntent::EditFolder { id: *id });
            let folder = ctx
                .engine
                .update_folder(UpdateFolder {
                    id: *id,
                    name: current.name.clone(),
                    parent_folder_id: *to,
                    last_editor_id: user.id,
                })
                .await?;
            let path = ctx.breadcrumbs.resolve(folder.id).await?;
            output::print_success(&format!("Folder '{}' moved to {}", folder.name, path));
        }
        FolderCommand::Delete { id, force } => {
            ctx.require_user()?;
            let current = resident_folder(ctx, *id).await?;
            if !super::confirm(&format!("Delete folder '{}'?", current.name), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.state.set_intent(PendingIntent::DeleteFolder {
                id: *id,
                parent: current.parent_folder_id,
            });
            ctx.engine
                .delete_folder(*id, current.parent_folder_id)
                .await?;
            output::print_success(&format!("Folder '{}' deleted", current.name));
        }
    }

    Ok(())
}
