//! File CLI commands.

use std::path::PathBuf;

use bytes::Bytes;
use clap::{Args, Subcommand};

use crate::commands::folder::resident_folder;
use crate::context::Context;
use crate::output;
use dochub_core::error::codes;
use dochub_core::types::{FileId, FolderId};
use dochub_core::{AppError, AppResult};
use dochub_entity::{CreateFile, File, PendingIntent, UpdateFile};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Upload a local file into a folder
    Upload {
        /// Local file to upload
        path: PathBuf,
        /// Target folder ID
        #[arg(short, long)]
        folder: FolderId,
        /// Name to store the file under (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Publish immediately
        #[arg(long)]
        publish: bool,
    },
    /// Download a file's content
    Download {
        /// File ID
        id: FileId,
        /// Folder containing the file
        #[arg(short, long)]
        folder: FolderId,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Rename a file
    Rename {
        /// File ID
        id: FileId,
        /// Folder containing the file
        #[arg(short, long)]
        folder: FolderId,
        /// New name
        #[arg(short, long)]
        name: String,
    },
    /// Publish or unpublish a file
    Publish {
        /// File ID
        id: FileId,
        /// Folder containing the file
        #[arg(short, long)]
        folder: FolderId,
        /// Withdraw publication instead
        #[arg(long)]
        unpublish: bool,
    },
    /// Move a file into another folder
    Move {
        /// File ID
        id: FileId,
        /// Folder containing the file
        #[arg(short, long)]
        folder: FolderId,
        /// Destination folder ID
        #[arg(short, long)]
        to: FolderId,
    },
    /// Delete a file
    Delete {
        /// File ID
        id: FileId,
        /// Folder containing the file
        #[arg(short, long)]
        folder: FolderId,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

async fn resident_file(ctx: &Context, id: FileId, folder: FolderId) -> AppResult<File> {
    resident_folder(ctx, folder).await?;
    ctx.state
        .files
        .get_by_id(id)
        .filter(|f| f.folder_id == folder)
        .ok_or_else(|| AppError::not_found(codes::FILE_NOT_FOUND))
}

async fn edit(
    ctx: &Context,
    file: &File,
    change: impl FnOnce(&mut UpdateFile),
) -> AppResult<File> {
    let user = ctx.require_user()?;
    let mut req = UpdateFile::from_file(file, user.id);
    change(&mut req);
    ctx.state.set_intent(PendingIntent::EditFile {
        id: file.id,
        folder_id: file.folder_id,
    });
    ctx.files.update_file(req).await
}

/// Execute file commands
pub async fn execute(ctx: &Context, args: &FileArgs) -> AppResult<()> {
    match &args.command {
        FileCommand::Upload {
            path,
            folder,
            name,
            publish,
        } => {
            let user = ctx.require_user()?;
            let name = match name {
                Some(name) => name.clone(),
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| AppError::validation(codes::REQUIRED_FILE_NAME))?,
            };
            let content = Bytes::from(tokio::fs::read(path).await?);
            resident_folder(ctx, *folder).await?;

            ctx.state
                .set_intent(PendingIntent::CreateFile { folder: *folder });
            let file = ctx
                .files
                .create_file(
                    CreateFile {
                        name,
                        folder_id: *folder,
                        last_editor_id: user.id,
                        is_published: *publish,
                    },
                    content,
                )
                .await?;
            output::print_success(&format!("Uploaded '{}' (id: {})", file.name, file.id));
        }
        FileCommand::Download { id, folder, out } => {
            let file = resident_file(ctx, *id, *folder).await?;
            let content = ctx.files.download(*id).await?;
            tokio::fs::create_dir_all(out).await?;
            let target = out.join(&file.name);
            tokio::fs::write(&target, &content).await?;
            output::print_success(&format!(
                "Saved '{}' ({} bytes) to {}",
                file.name,
                content.len(),
                target.display()
            ));
        }
        FileCommand::Rename { id, folder, name } => {
            let file = resident_file(ctx, *id, *folder).await?;
            let updated = edit(ctx, &file, |req| req.name = name.clone()).await?;
            output::print_success(&format!("File {} renamed to '{}'", updated.id, updated.name));
        }
        FileCommand::Publish {
            id,
            folder,
            unpublish,
        } => {
            let file = resident_file(ctx, *id, *folder).await?;
            let updated = edit(ctx, &file, |req| req.is_published = !*unpublish).await?;
            let verb = if updated.is_published {
                "published"
            } else {
                "unpublished"
            };
            output::print_success(&format!("File '{}' {}", updated.name, verb));
        }
        FileCommand::Move { id, folder, to } => {
            let file = resident_file(ctx, *id, *folder).await?;
            resident_folder(ctx, *to).await?;
            let updated = edit(ctx, &file, |req| req.folder_id = *to).await?;
            output::print_success(&format!(
                "File '{}' moved to folder {}",
                updated.name, updated.folder_id
            ));
        }
        FileCommand::Delete { id, folder, force } => {
            ctx.require_user()?;
            let file = resident_file(ctx, *id, *folder).await?;
            if !super::confirm(&format!("Delete file '{}'?", file.name), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.state.set_intent(PendingIntent::DeleteFile {
                id: *id,
                folder_id: *folder,
            });
            ctx.files.delete_file(*id, *folder).await?;
            output::print_success(&format!("File '{}' deleted", file.name));
        }
    }

    Ok(())
}
