use async_trait::async_trait;
use parking_lot::RwLock;
use prbridge_types::Repository;

use crate::{RepositoryStore, StorageError};

/// In-process store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    repositories: RwLock<Vec<Repository>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(repositories: Vec<Repository>) -> Self {
        Self {
            repositories: RwLock::new(repositories),
        }
    }
}

#[async_trait]
impl RepositoryStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Repository>, StorageError> {
        Ok(self.repositories.read().clone())
    }

    async fn save(&self, repositories: &[Repository]) -> Result<(), StorageError> {
        *self.repositories.write() = repositories.to_vec();
        Ok(())
    }
}
