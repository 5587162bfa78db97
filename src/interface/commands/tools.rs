//! # Tools Command
//!
//! Handles `taskgrid tools`: prints the tool schema declared to the model.

use anyhow::Result;

use crate::infrastructure::llm::file_tools;

pub fn handle_tools() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(file_tools())?);
    Ok(())
}
