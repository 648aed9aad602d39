use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5050";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Base URL of the local automation server.
    #[serde(
        rename = "serverUrl",
        alias = "server_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_url: Option<String>,

    /// Where the repository mapping record lives.
    #[serde(
        rename = "storagePath",
        alias = "storage_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub storage_path: Option<PathBuf>,

    #[serde(
        rename = "logLevel",
        alias = "log_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub log_level: Option<String>,
}

impl Config {
    /// Fields set in `other` replace ours.
    pub fn merge(&mut self, other: Config) {
        merge_option_replace(&mut self.schema, other.schema);
        merge_option_replace(&mut self.server_url, other.server_url);
        merge_option_replace(&mut self.storage_path, other.storage_path);
        merge_option_replace(&mut self.log_level, other.log_level);
    }

    pub fn server_url(&self) -> &str {
        self.server_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(default_storage_path)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
}

/// `<config_dir>/prbridge/storage.json`
pub fn default_storage_path() -> PathBuf {
    config_home().join("storage.json")
}

pub(crate) fn config_home() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("prbridge")
}

fn merge_option_replace<T>(target: &mut Option<T>, source: Option<T>) {
    if let Some(value) = source {
        *target = Some(value);
    }
}
