//! # Messages
//!
//! Result messages reported to the observer and fed back to the model,
//! plus user-facing CLI text.

pub const API_KEY_MISSING: &str = "API key is missing";
pub const MODEL_NOT_SELECTED: &str = "Model is not selected";
pub const PRIMARY_REQUEST: &str = "API request";
pub const FOLLOW_UP_REQUEST: &str = "Follow-up API request";

pub fn read_success(path: &str) -> String {
    format!("Successfully read {path}")
}

pub fn write_success(path: &str) -> String {
    format!("Successfully wrote {path}")
}

pub fn create_dir_success(path: &str) -> String {
    format!("Successfully created directory {path}")
}

pub fn delete_success(path: &str) -> String {
    format!("Successfully deleted {path}")
}

/// Listing rendered as a bullet list of entry names (last path segment).
pub fn directory_listing(path: &str, entries: &[String]) -> String {
    let lines: Vec<String> = entries
        .iter()
        .map(|e| format!("- {}", e.rsplit('/').next().unwrap_or(e)))
        .collect();
    format!("Directory {path} contains:\n{}", lines.join("\n"))
}

pub fn tool_error(tool: &str, err: &str) -> String {
    format!("Error executing {tool}: {err}")
}

pub fn no_configuration(path: &str) -> String {
    format!("No configuration found. Create {path} with an OpenRouter API key and model.")
}

pub fn operation_line(success: bool, kind: &str, path: &str, message: &str) -> String {
    let mark = if success { "✅" } else { "❌" };
    format!("{mark} [{kind}] {path}: {message}")
}

pub const TURN_CANCELLED: &str = "🛑 Turn cancelled.";
