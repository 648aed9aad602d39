use std::path::{Path, PathBuf};

use async_trait::async_trait;
use prbridge_types::{Repository, StorageData};
use tracing::{debug, info};

use crate::{encode, RepositoryStore, StorageError};

/// Keeps the mapping table as one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RepositoryStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Repository>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no storage record yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::ReadError {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let record: StorageData =
            serde_json::from_str(&content).map_err(|source| StorageError::ParseError {
                path: self.path.clone(),
                source,
            })?;
        Ok(record.repositories)
    }

    async fn save(&self, repositories: &[Repository]) -> Result<(), StorageError> {
        let content = encode(repositories)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::WriteError {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| StorageError::WriteError {
                path: self.path.clone(),
                source,
            })?;

        info!(
            path = %self.path.display(),
            count = repositories.len(),
            "repository mappings saved"
        );
        Ok(())
    }
}
