//! # Session
//!
//! The sandbox root for one working directory. Passed explicitly into every
//! broker, collector and tool-loop call instead of living in shared state.

use std::path::Path;

use crate::domain::paths::SANDBOX_DIR;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    working_dir: String,
    sandbox_root: String,
}

impl Session {
    /// Builds a session for `working_dir`; the sandbox root is `<working_dir>/.taskgrid`.
    /// An empty working directory produces an unset session.
    pub fn new(working_dir: impl Into<String>) -> Self {
        let raw = working_dir.into().replace('\\', "/");
        if raw.is_empty() {
            return Self::unset();
        }

        let trimmed = raw.trim_end_matches('/');
        let working_dir = if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() };
        let sandbox_root = format!("{}/{}", trimmed, SANDBOX_DIR);

        Self { working_dir, sandbox_root }
    }

    /// A session with no working directory. Every path is rejected against it.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        !self.working_dir.is_empty()
    }

    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    /// Sandbox root as a forward-slash string
    pub fn sandbox_root(&self) -> &str {
        &self.sandbox_root
    }

    pub fn sandbox_root_path(&self) -> &Path {
        Path::new(&self.sandbox_root)
    }

    /// Joins a sandbox-relative path onto the root without normalising it,
    /// so traversal segments are still visible to the path guard.
    pub fn resolve(&self, relative: &str) -> String {
        format!("{}/{}", self.sandbox_root, relative)
    }
}
