use std::path::{Path, PathBuf};

use prbridge_storage::RepositoryStore;
use prbridge_types::{normalize_repo_url, Repository};

use crate::cli::RepoCommands;

pub(crate) async fn handle_repo_command(
    action: RepoCommands,
    store: &dyn RepositoryStore,
) -> anyhow::Result<()> {
    match action {
        RepoCommands::List => {
            let repositories = store.load().await?;
            if repositories.is_empty() {
                println!("No repositories configured.");
                return Ok(());
            }
            println!("\nConfigured repositories:\n");
            for repository in &repositories {
                println!("  {:<50} {}", repository.url, repository.path);
            }
            println!();
        }
        RepoCommands::Add { url, path } => {
            let url = url.trim().to_string();
            if url.is_empty() {
                anyhow::bail!("Repository URL is empty");
            }
            let path = absolute_path(&path)?;
            if !path.is_dir() {
                tracing::warn!(path = %path.display(), "mapped path is not a directory");
            }

            let repositories = store
                .add(Repository::new(url.clone(), path.display().to_string()))
                .await?;
            let shadowed = repositories
                .iter()
                .filter(|r| r.normalized_url() == normalize_repo_url(&url))
                .count()
                > 1;
            println!("Mapped {} -> {}", url, path.display());
            if shadowed {
                println!("Note: an earlier mapping for this repository takes precedence.");
            }
        }
        RepoCommands::Remove { url } => {
            let removed = store.remove(url.trim()).await?;
            if removed == 0 {
                anyhow::bail!("No mapping found for {}", url);
            }
            println!("Removed {} mapping(s) for {}", removed, url);
        }
    }

    Ok(())
}

fn absolute_path(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
