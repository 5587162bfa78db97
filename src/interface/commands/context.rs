//! # Context Command
//!
//! Handles `taskgrid context`: prints the file snapshot the assistant would be grounded with.

use anyhow::Result;
use std::path::Path;

use crate::domain::config::{ContextLimits, Settings};
use crate::domain::session::Session;
use crate::infrastructure::tools::ContextCollector;

pub async fn handle_context(
    working_dir: &Path,
    settings: &Settings,
    max_files: Option<usize>,
    max_depth: Option<usize>,
) -> Result<()> {
    let limits = ContextLimits {
        max_files: max_files.unwrap_or(settings.context.max_files),
        max_depth: max_depth.unwrap_or(settings.context.max_depth),
    };

    let session = Session::new(working_dir.to_string_lossy().to_string());
    let collected = ContextCollector::default()
        .collect(&session, limits.max_files, limits.max_depth)
        .await;

    println!("{}", ContextCollector::format_for_model(&collected.files));
    if collected.skipped > 0 {
        eprintln!("({} entries skipped)", collected.skipped);
    }
    Ok(())
}
