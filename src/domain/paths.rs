//! # Workspace Paths
//!
//! Centralized definitions for the sandbox layout.
//! Acts as the single source of truth for where the sandbox and its config files live.

use std::path::{Path, PathBuf};

/// Name of the sandbox folder inside a working directory.
pub const SANDBOX_DIR: &str = ".taskgrid";
pub const CONFIG_DIR: &str = "config";
pub const OPENROUTER_CONFIG_FILE: &str = "openrouter.json";
pub const SETTINGS_FILE: &str = "taskgrid.yaml";
pub const LOGS_DIR: &str = "logs";
pub const SESSION_LOG_FILE: &str = "session.log";

/// Returns the sandbox root for a working directory (`<dir>/.taskgrid`)
pub fn sandbox_root(working_dir: &Path) -> PathBuf {
    working_dir.join(SANDBOX_DIR)
}

/// Returns the full path to the model credentials file given a working directory
pub fn openrouter_config_path(working_dir: &Path) -> PathBuf {
    sandbox_root(working_dir).join(CONFIG_DIR).join(OPENROUTER_CONFIG_FILE)
}

/// Returns the full path to the runtime settings file given a working directory
pub fn settings_path(working_dir: &Path) -> PathBuf {
    sandbox_root(working_dir).join(CONFIG_DIR).join(SETTINGS_FILE)
}

/// Fallback log directory inside the sandbox
pub fn sandbox_logs_dir(working_dir: &Path) -> PathBuf {
    sandbox_root(working_dir).join(LOGS_DIR)
}
