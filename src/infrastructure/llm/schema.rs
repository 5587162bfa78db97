//! # File Tool Schema
//!
//! The fixed set of tools declared to the model. Names and required fields are
//! part of the contract with the remote model; changing them is a breaking change.

use serde_json::{Value, json};
use std::sync::OnceLock;

use crate::domain::types::FileOperationKind;
use crate::infrastructure::llm::types::{FunctionDefinition, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTool {
    ReadFile,
    WriteFile,
    CreateDirectory,
    ListDirectory,
    DeleteFile,
}

impl FileTool {
    pub const ALL: [FileTool; 5] = [
        FileTool::ReadFile,
        FileTool::WriteFile,
        FileTool::CreateDirectory,
        FileTool::ListDirectory,
        FileTool::DeleteFile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FileTool::ReadFile => "read_file",
            FileTool::WriteFile => "write_file",
            FileTool::CreateDirectory => "create_directory",
            FileTool::ListDirectory => "list_directory",
            FileTool::DeleteFile => "delete_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn kind(&self) -> FileOperationKind {
        match self {
            FileTool::ReadFile => FileOperationKind::Read,
            FileTool::WriteFile => FileOperationKind::Write,
            FileTool::CreateDirectory => FileOperationKind::CreateDir,
            FileTool::ListDirectory => FileOperationKind::List,
            FileTool::DeleteFile => FileOperationKind::Delete,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            FileTool::ReadFile => "Read the contents of a file in the .taskgrid folder. Use this when you need to reference existing file contents or understand the current state of files.",
            FileTool::WriteFile => "Create or overwrite a file in the .taskgrid folder. Use this to create new files or update existing ones based on user requests.",
            FileTool::CreateDirectory => "Create a new directory in the .taskgrid folder. Use this to organize files and create new project structures.",
            FileTool::ListDirectory => "List the contents of a directory in the .taskgrid folder. Use this to explore the workspace structure.",
            FileTool::DeleteFile => "Delete a file in the .taskgrid folder. Only use this when explicitly requested by the user.",
        }
    }

    fn parameters(&self) -> Value {
        let path_hint = match self {
            FileTool::ReadFile => r#"The relative path within .taskgrid folder (e.g., "tasks/my-task.md" or "project/main.ts")"#,
            FileTool::WriteFile => r#"The relative path within .taskgrid folder (e.g., "tasks/my-task.md" or "config/settings.json")"#,
            FileTool::CreateDirectory => r#"The relative path within .taskgrid folder (e.g., "project/subfolder")"#,
            FileTool::ListDirectory => r#"The relative path within .taskgrid folder. Use "." or "project" to list directories."#,
            FileTool::DeleteFile => r#"The relative path within .taskgrid folder (e.g., "tasks/old-task.md")"#,
        };
        let reason_hint = match self {
            FileTool::ReadFile => "Brief explanation of why you need to read this file",
            FileTool::WriteFile => "Brief explanation of what file you are creating/updating and why",
            FileTool::CreateDirectory => "Brief explanation of what directory you are creating and why",
            FileTool::ListDirectory => "Brief explanation of what directory you are listing and why",
            FileTool::DeleteFile => "Brief explanation of what file you are deleting and why",
        };

        if *self == FileTool::WriteFile {
            return json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": path_hint},
                    "content": {
                        "type": "string",
                        "description": "The content to write to the file. Should be properly formatted according to the file type."
                    },
                    "reason": {"type": "string", "description": reason_hint}
                },
                "required": ["path", "content", "reason"]
            });
        }

        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": path_hint},
                "reason": {"type": "string", "description": reason_hint}
            },
            "required": ["path", "reason"]
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            },
        }
    }
}

/// The five declared file tools, built once.
pub fn file_tools() -> &'static [ToolDefinition] {
    static TOOLS: OnceLock<Vec<ToolDefinition>> = OnceLock::new();
    TOOLS.get_or_init(|| FileTool::ALL.iter().map(FileTool::definition).collect())
}
