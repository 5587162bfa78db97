//! # Configuration
//!
//! Loads the model credentials file (`.taskgrid/config/openrouter.json`) and the
//! optional runtime settings file (`taskgrid.yaml`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::paths;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1";

/// Model credentials. Matches the layout of `config/openrouter.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub openrouter: OpenRouterConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    /// Display name only; never sent to the endpoint
    #[serde(default)]
    pub model_name: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            openrouter: OpenRouterConfig {
                api_key: api_key.into(),
                model: model.into(),
                model_name: String::new(),
            },
        }
    }
}

/// Reads `<working_dir>/.taskgrid/config/openrouter.json`.
/// A missing file means "no configuration", not an error.
pub fn load_config(working_dir: &Path) -> Result<Option<Config>> {
    let path = paths::openrouter_config_path(working_dir);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// Runtime settings. Every field is optional in `taskgrid.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub context: ContextLimits,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
            context: ContextLimits::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ContextLimits {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            directory: None,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_files() -> usize {
    5
}
fn default_max_depth() -> usize {
    2
}
fn default_filter() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from an explicit file, else from the sandbox's
    /// `config/taskgrid.yaml` when present, else defaults.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = paths::settings_path(working_dir);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Directory for `session.log`: configured, else the user data dir, else inside the sandbox.
    pub fn log_directory(&self, working_dir: &Path) -> PathBuf {
        if let Some(dir) = &self.logging.directory {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join("taskgrid"))
            .unwrap_or_else(|| paths::sandbox_logs_dir(working_dir))
    }
}
