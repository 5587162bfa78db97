//! # Domain Traits
//!
//! Abstract interfaces for the collaborators the broker delegates to.
//! Allows the privileged executor to be swapped (in-process, host IPC, remote).

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::domain::types::FileOperationResult;

/// Confined file primitives scoped to a sandbox root plus a relative path.
///
/// Implementations enforce the sandbox boundary themselves; callers only
/// pre-validate textually.
#[async_trait]
pub trait FileExecutor: Send + Sync {
    async fn read_file(&self, root: &Path, relative: &Path) -> Result<String>;

    /// Creates missing parent directories.
    async fn write_file(&self, root: &Path, relative: &Path, content: &str) -> Result<()>;

    /// Entry paths relative to `root`, in the order the directory listing yields them.
    async fn list_directory(&self, root: &Path, relative: &Path) -> Result<Vec<String>>;

    async fn delete_file(&self, root: &Path, relative: &Path) -> Result<()>;

    /// Succeeds if the directory already exists.
    async fn create_directory(&self, root: &Path, relative: &Path) -> Result<()>;
}

/// Side channel that sees every tool execution outcome, in order.
pub type FileOperationObserver = Arc<dyn Fn(&FileOperationResult) + Send + Sync>;
