//! DocHub CLI entry point.
//!
//! Loads configuration, initialises logging, wires the HTTP transport into
//! the caches and runs one command.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod context;
mod output;

use commands::Cli;
use context::Context;
use dochub_core::AppResult;
use dochub_core::config::AppConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(&cli, config).await {
        tracing::debug!(kind = %e.kind, "Command failed");
        output::print_error(e.code());
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. Logs go to stderr so command output stays
/// machine-readable.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(cli: &Cli, config: AppConfig) -> AppResult<()> {
    tracing::debug!(base_url = %config.client.base_url, "Starting DocHub v{}", env!("CARGO_PKG_VERSION"));
    let ctx = Context::connect(config).await?;
    cli.execute(&ctx).await
}
