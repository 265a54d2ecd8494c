//! Recent-activity CLI command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::context::Context;
use crate::output::{self, OutputFormat};
use dochub_core::AppResult;
use dochub_core::types::FolderId;
use dochub_entity::EntryRef;

/// Arguments for `recent`
#[derive(Debug, Args)]
pub struct RecentArgs {
    /// Folder to load before reading the feed
    #[arg(short, long, default_value = "1")]
    pub folder: FolderId,
}

/// Feed display row
#[derive(Debug, Serialize, Tabled)]
struct RecentRow {
    /// Folder or file
    kind: String,
    /// ID
    id: u32,
    /// Name
    name: String,
    /// Containing folder
    location: String,
    /// Last update
    updated: String,
}

/// Execute the `recent` command
pub async fn execute(ctx: &Context, args: &RecentArgs, format: OutputFormat) -> AppResult<()> {
    ctx.engine.fetch_folder(args.folder).await?;

    let mut rows = Vec::new();
    for entry in ctx.engine.recent_activity() {
        let id = match entry.entry {
            EntryRef::Folder(id) => id.get(),
            EntryRef::File(id) => id.get(),
        };
        rows.push(RecentRow {
            kind: entry.entry.kind().to_string(),
            id,
            name: entry.name,
            location: ctx.breadcrumbs.resolve(entry.location).await?.to_string(),
            updated: super::timestamp(entry.updated_at),
        });
    }

    output::print_list(&rows, format);
    Ok(())
}
