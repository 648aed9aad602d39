use crate::schema::config_home;
use crate::Config;
use anyhow::{Context, Result};
use jsonc_parser::{parse_to_serde_value, ParseOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{env:([^}]+)\}").expect("env reference pattern"));

const CONFIG_FILE_NAMES: [&str; 2] = ["prbridge.jsonc", "prbridge.json"];

pub const ENV_SERVER_URL: &str = "PRBRIDGE_SERVER_URL";
pub const ENV_STORAGE_PATH: &str = "PRBRIDGE_STORAGE_PATH";
pub const ENV_LOG: &str = "PRBRIDGE_LOG";

pub struct ConfigLoader {
    config: Config,
    config_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            config_paths: Vec::new(),
        }
    }

    pub fn load_from_str(&mut self, content: &str) -> Result<()> {
        let config = parse_jsonc(&substitute_env_vars(content))
            .with_context(|| "Failed to parse config content")?;
        self.config.merge(config);
        Ok(())
    }

    /// Merges `path` if it exists. A missing file is not an error.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let content = substitute_env_vars(&content);
        let config = parse_jsonc(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        self.config.merge(config);
        self.config_paths.push(path.to_path_buf());
        Ok(())
    }

    pub fn load_global(&mut self) -> Result<()> {
        self.load_first_in(&config_home())
    }

    pub fn load_project<P: AsRef<Path>>(&mut self, project_dir: P) -> Result<()> {
        self.load_first_in(project_dir.as_ref())
    }

    /// Applies `PRBRIDGE_*` overrides from the process environment.
    pub fn load_from_env(&mut self) {
        self.apply_env(|name| env::var(name).ok());
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        self.config.merge(Config {
            server_url: value(ENV_SERVER_URL),
            storage_path: value(ENV_STORAGE_PATH).map(PathBuf::from),
            log_level: value(ENV_LOG),
            ..Default::default()
        });
    }

    /// Loads every source, lowest precedence first:
    /// 1. Global config (`<config_dir>/prbridge/prbridge.json{c,}`)
    /// 2. Project config (`<project_dir>/prbridge.json{c,}`)
    /// 3. Explicit config file, if given
    /// 4. `PRBRIDGE_*` environment variables
    pub fn load_all<P: AsRef<Path>>(
        &mut self,
        project_dir: P,
        explicit: Option<&Path>,
    ) -> Result<Config> {
        self.load_global()?;
        self.load_project(project_dir)?;
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            self.load_from_file(path)?;
        }
        self.load_from_env();
        Ok(self.config.clone())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    fn load_first_in(&mut self, dir: &Path) -> Result<()> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return self.load_from_file(&path);
            }
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_config<P: AsRef<Path>>(project_dir: P, explicit: Option<&Path>) -> Result<Config> {
    ConfigLoader::new().load_all(project_dir, explicit)
}

/// Substitute `{env:VAR}` patterns with environment variable values.
/// Works on the raw JSONC text before parsing.
fn substitute_env_vars(text: &str) -> String {
    ENV_REFERENCE
        .replace_all(text, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .to_string()
}

fn parse_jsonc(content: &str) -> Result<Config> {
    let parse_options = ParseOptions {
        allow_trailing_commas: true,
        ..Default::default()
    };
    let parsed = parse_to_serde_value(content, &parse_options)
        .with_context(|| "Failed to parse JSONC")?
        .context("Config content is empty")?;
    serde_json::from_value(parsed).with_context(|| "Failed to parse config JSON")
}
