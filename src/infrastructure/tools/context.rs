//! # Context Collector
//!
//! Gathers a text snapshot of sandbox files to ground the assistant.
//! Collection is best-effort: entries that fail to stat or read are skipped and
//! counted, never raised.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::session::Session;
use crate::domain::types::{CollectedContext, FileContext};
use crate::infrastructure::tools::broker::FileBroker;
use crate::infrastructure::tools::guard::PathGuard;
use crate::strings::prompts;

/// Upper bound on explicit paths resolved by `collect_from_paths`.
pub const MAX_EXPLICIT_PATHS: usize = 10;

#[derive(Clone, Default)]
pub struct ContextCollector {
    broker: FileBroker,
}

impl ContextCollector {
    pub fn new(broker: FileBroker) -> Self {
        Self { broker }
    }

    /// Breadth-first walk of the sandbox root. Entries within a directory are
    /// visited in name order, so the result is deterministic for a given tree.
    ///
    /// Depth 0 is the sandbox root itself; directories deeper than `max_depth`
    /// are not entered. Stops once `max_files` files are collected.
    pub async fn collect(&self, session: &Session, max_files: usize, max_depth: usize) -> CollectedContext {
        let mut out = CollectedContext::default();
        if !session.is_set() || max_files == 0 {
            return out;
        }

        let root = session.sandbox_root_path().to_path_buf();
        if !root.is_dir() {
            return out;
        }

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut queue: VecDeque<(PathBuf, String, usize)> = VecDeque::new();
        queue.push_back((root, String::new(), 0));

        while let Some((dir, rel_dir, depth)) = queue.pop_front() {
            if out.files.len() >= max_files {
                break;
            }
            if depth > max_depth || !visited.insert(dir.clone()) {
                continue;
            }

            let mut names = match read_dir_names(&dir).await {
                Ok(names) => names,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    out.skipped += 1;
                    continue;
                }
            };
            names.sort();

            for name in names {
                if out.files.len() >= max_files {
                    break;
                }

                let entry_path = dir.join(&name);
                let entry_rel = if rel_dir.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", rel_dir, name)
                };

                let metadata = match tokio::fs::symlink_metadata(&entry_path).await {
                    Ok(m) => m,
                    Err(e) => {
                        debug!(path = %entry_rel, error = %e, "skipping entry that failed to stat");
                        out.skipped += 1;
                        continue;
                    }
                };

                if metadata.is_file() {
                    match tokio::fs::read_to_string(&entry_path).await {
                        Ok(content) => out.files.push(FileContext::present(entry_rel, content)),
                        Err(e) => {
                            debug!(path = %entry_rel, error = %e, "skipping unreadable file");
                            out.skipped += 1;
                        }
                    }
                } else if metadata.is_dir() {
                    queue.push_back((entry_path, entry_rel, depth + 1));
                }
            }
        }

        out
    }

    /// Resolves an explicit list of paths. Paths failing the guard are dropped,
    /// at most `MAX_EXPLICIT_PATHS` are resolved, and a path that cannot be
    /// read yields an `exists: false` record instead of an error.
    pub async fn collect_from_paths(&self, session: &Session, paths: &[String]) -> Vec<FileContext> {
        let mut contexts = Vec::new();

        for path in paths {
            if contexts.len() >= MAX_EXPLICIT_PATHS {
                break;
            }
            let Some(relative) = PathGuard::relative(session, path) else {
                debug!(path = %path, "dropping context path outside sandbox");
                continue;
            };

            let context = match self.broker.read(session, path).await {
                Ok(content) => FileContext::present(relative, content),
                Err(_) => FileContext::missing(relative),
            };
            contexts.push(context);
        }

        contexts
    }

    /// Renders contexts as one section per file: the body in a code fence, or a
    /// "(does not exist)" marker. Empty input yields a fixed sentinel.
    pub fn format_for_model(contexts: &[FileContext]) -> String {
        if contexts.is_empty() {
            return prompts::NO_FILES_IN_CONTEXT.to_string();
        }

        let sections: Vec<String> = contexts
            .iter()
            .map(|ctx| {
                if ctx.exists {
                    prompts::file_section(&ctx.path, ctx.content.as_deref().unwrap_or_default())
                } else {
                    prompts::missing_file_section(&ctx.path)
                }
            })
            .collect();

        prompts::available_files(&sections.join("\n\n"))
    }
}

async fn read_dir_names(dir: &std::path::Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}
