use serde::{Deserialize, Serialize};

/// A user-configured association between a remote repository and a local
/// checkout.
///
/// `url` is stored as the user typed it and may still carry a trailing `/` or
/// a `.git` suffix; comparison happens on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
    pub path: String,
}

impl Repository {
    pub fn new(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }

    pub fn normalized_url(&self) -> &str {
        normalize_repo_url(&self.url)
    }
}

/// Strips one trailing `/`, then one trailing `.git`. Nothing else changes:
/// scheme, host and case are compared as stored.
pub fn normalize_repo_url(url: &str) -> &str {
    let url = url.strip_suffix('/').unwrap_or(url);
    url.strip_suffix(".git").unwrap_or(url)
}

/// The single persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    #[serde(default)]
    pub repositories: Vec<Repository>,
}
