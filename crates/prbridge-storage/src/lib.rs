//! Persistence for the repository mapping table.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use prbridge_types::{normalize_repo_url, Repository, StorageData};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed storage record in {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode storage record: {0}")]
    EncodeError(#[from] serde_json::Error),
}

/// The single persisted record holding every mapping entry. Reads of a
/// missing record yield an empty list; saves replace the record (last write
/// wins).
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Repository>, StorageError>;

    async fn save(&self, repositories: &[Repository]) -> Result<(), StorageError>;

    /// Appends an entry. Duplicates are kept; lookups use the first match.
    async fn add(&self, repository: Repository) -> Result<Vec<Repository>, StorageError> {
        let mut repositories = self.load().await?;
        repositories.push(repository);
        self.save(&repositories).await?;
        Ok(repositories)
    }

    /// Removes every entry whose url equals `url` as stored or after
    /// normalization. Returns how many were removed.
    async fn remove(&self, url: &str) -> Result<usize, StorageError> {
        let mut repositories = self.load().await?;
        let before = repositories.len();
        let target = normalize_repo_url(url);
        repositories.retain(|r| r.url != url && r.normalized_url() != target);
        let removed = before - repositories.len();
        if removed > 0 {
            self.save(&repositories).await?;
        }
        Ok(removed)
    }
}

pub(crate) fn encode(repositories: &[Repository]) -> Result<String, StorageError> {
    let record = StorageData {
        repositories: repositories.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&record)?)
}
