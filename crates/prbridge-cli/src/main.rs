use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod cli;
mod page;
mod repo_cmd;
mod send;

use cli::*;
use page::{handle_click, handle_scan};
use prbridge_config::load_config;
use prbridge_core::MessageBus;
use prbridge_router::{AutomationClient, MessageRouter};
use prbridge_storage::JsonFileStore;
use repo_cmd::handle_repo_command;
use send::{build_intent, handle_send};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, cli.config.as_deref()).context("Failed to load config")?;
    if let Some(server_url) = cli.server_url {
        config.server_url = Some(server_url);
    }

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"))
        .join("prbridge")
        .join("log");
    let _log = prbridge_util::init_tracing(config.log_level(), Some(log_dir), cli.print_logs);
    tracing::debug!(server_url = config.server_url(), storage = %config.storage_path().display(), "config loaded");

    let store = Arc::new(JsonFileStore::new(config.storage_path()));
    let bus = Arc::new(MessageBus::new());
    let router = MessageRouter::new(
        store.clone(),
        AutomationClient::new(config.server_url()),
        bus.clone(),
    );

    match cli.command {
        Commands::Repo { action } => {
            handle_repo_command(action, store.as_ref()).await?;
        }
        Commands::Scan { html, url, out } => {
            handle_scan(html, url, out).await?;
        }
        Commands::Click { html, url, control } => {
            handle_click(html, url, control, router, bus).await?;
        }
        Commands::Send {
            repo_url,
            file,
            comment,
            snippet,
            execute,
        } => {
            let intent = build_intent(repo_url, file, comment, snippet, execute)?;
            handle_send(&router, intent).await?;
        }
    }

    Ok(())
}
