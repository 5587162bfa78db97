//! # Local Executor
//!
//! In-process privileged executor for sandbox file operations.
//! Enforces the sandbox by canonicalizing every target and checking it against
//! the canonical sandbox root, so symlinks and `..` cannot escape.

use anyhow::{Context as AnyhowContext, Result, bail};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::domain::traits::FileExecutor;

const ACCESS_DENIED: &str = "Access denied: Path is outside .taskgrid folder";

/// Executes confined filesystem operations directly with `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Validates that `root/relative` is safe to access.
    /// Returns the canonical absolute path (non-existent tails re-appended) if safe.
    pub fn confine(&self, root: &Path, relative: &Path) -> Result<PathBuf> {
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => bail!(ACCESS_DENIED),
            }
        }

        let canonical_root = root
            .canonicalize()
            .with_context(|| format!("Sandbox root does not exist: {}", root.display()))?;
        let resolved = canonicalize_existing_prefix(&canonical_root.join(relative))?;

        if resolved.starts_with(&canonical_root) {
            Ok(resolved)
        } else {
            bail!(ACCESS_DENIED)
        }
    }

    async fn ensure_root(&self, root: &Path) -> Result<()> {
        if !root.exists() {
            tokio::fs::create_dir_all(root)
                .await
                .with_context(|| format!("Failed to create sandbox root {}", root.display()))?;
        }
        Ok(())
    }
}

/// Symbolic links followed while resolving one path before giving up.
const MAX_LINK_DEPTH: usize = 40;

/// Canonicalizes the longest existing ancestor of `path` and re-appends the
/// remaining (not yet existing) components.
///
/// Existence is probed without following links, so a dangling symlink counts
/// as present and is resolved through its target rather than re-appended verbatim.
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf> {
    resolve_prefix(path, 0)
}

fn resolve_prefix(path: &Path, depth: usize) -> Result<PathBuf> {
    let mut current = path.to_path_buf();
    let mut tail = Vec::new();

    loop {
        if let Ok(metadata) = std::fs::symlink_metadata(&current) {
            let mut resolved = match current.canonicalize() {
                Ok(resolved) => resolved,
                Err(_) if metadata.file_type().is_symlink() => {
                    if depth >= MAX_LINK_DEPTH {
                        bail!("Too many levels of symbolic links: {}", path.display());
                    }
                    let link = std::fs::read_link(&current)?;
                    let target = match current.parent() {
                        Some(parent) => parent.join(link),
                        None => link,
                    };
                    resolve_prefix(&target, depth + 1)?
                }
                Err(e) => return Err(e.into()),
            };
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return Ok(resolved);
        }

        match (current.file_name(), current.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_owned());
                current = parent.to_path_buf();
            }
            _ => bail!("Unable to validate path: {}", path.display()),
        }
    }
}

fn to_relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl FileExecutor for LocalExecutor {
    async fn read_file(&self, root: &Path, relative: &Path) -> Result<String> {
        let target = self.confine(root, relative)?;
        if !target.is_file() {
            bail!("File does not exist: {}", to_relative_string(relative));
        }
        Ok(tokio::fs::read_to_string(&target).await?)
    }

    async fn write_file(&self, root: &Path, relative: &Path, content: &str) -> Result<()> {
        self.ensure_root(root).await?;
        let target = self.confine(root, relative)?;
        if target.is_dir() {
            bail!("Path is a directory: {}", to_relative_string(relative));
        }

        if let Some(parent) = target.parent()
            && !parent.exists()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create parent directory")?;
        }

        Ok(tokio::fs::write(&target, content).await?)
    }

    async fn list_directory(&self, root: &Path, relative: &Path) -> Result<Vec<String>> {
        let target = self.confine(root, relative)?;
        if !target.is_dir() {
            bail!("Directory does not exist: {}", to_relative_string(relative));
        }

        let canonical_root = root.canonicalize()?;
        let mut entries = tokio::fs::read_dir(&target).await?;
        let mut listing = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let rel = path.strip_prefix(&canonical_root).unwrap_or(&path);
            listing.push(to_relative_string(rel));
        }
        Ok(listing)
    }

    async fn delete_file(&self, root: &Path, relative: &Path) -> Result<()> {
        let target = self.confine(root, relative)?;
        if !target.exists() {
            bail!("File does not exist: {}", to_relative_string(relative));
        }
        if !target.is_file() {
            bail!("Not a file: {}", to_relative_string(relative));
        }
        Ok(tokio::fs::remove_file(&target).await?)
    }

    async fn create_directory(&self, root: &Path, relative: &Path) -> Result<()> {
        self.ensure_root(root).await?;
        let target = self.confine(root, relative)?;
        if target.exists() {
            if target.is_dir() {
                return Ok(());
            }
            bail!("Path exists and is not a directory: {}", to_relative_string(relative));
        }
        Ok(tokio::fs::create_dir_all(&target).await?)
    }
}
