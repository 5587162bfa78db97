//! # Path Guard
//!
//! Textual containment check for sandbox paths. Runs before any I/O.
//!
//! This does not resolve symlinks; the executor repeats the check on
//! canonicalized paths (see `LocalExecutor`).

use crate::domain::session::Session;

pub struct PathGuard;

impl PathGuard {
    /// True when `path` stays at or under the session's sandbox root.
    pub fn validate(session: &Session, path: &str) -> bool {
        Self::relative(session, path).is_some()
    }

    /// Returns `path` relative to the sandbox root, with separators normalized
    /// and empty / `.` segments dropped. The root itself maps to `""`.
    ///
    /// Returns None when the session is unset, when an absolute path lies
    /// outside the root, or when any `..` segment remains after stripping the root.
    pub fn relative(session: &Session, path: &str) -> Option<String> {
        if !session.is_set() {
            return None;
        }

        let normalized = path.replace('\\', "/");
        let root = session.sandbox_root();

        let rest = if normalized == root {
            ""
        } else if let Some(stripped) = normalized
            .strip_prefix(root)
            .filter(|r| r.starts_with('/'))
        {
            stripped
        } else if is_absolute(&normalized) {
            return None;
        } else {
            normalized.as_str()
        };

        let mut segments = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                s => segments.push(s),
            }
        }
        Some(segments.join("/"))
    }
}

fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    // Drive-letter paths ("C:/...")
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
