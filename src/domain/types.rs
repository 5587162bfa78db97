//! # Domain Types
//!
//! Common data structures shared by the broker, the context collector and the tool loop.

use serde::{Deserialize, Serialize};

/// The five primitive sandbox operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperationKind {
    Read,
    Write,
    List,
    Delete,
    CreateDir,
}

impl FileOperationKind {
    pub fn as_str(&self) -> &str {
        match self {
            FileOperationKind::Read => "read",
            FileOperationKind::Write => "write",
            FileOperationKind::List => "list",
            FileOperationKind::Delete => "delete",
            FileOperationKind::CreateDir => "create_dir",
        }
    }

    /// Verb phrase used in failure messages ("Failed to read file: ...")
    pub fn action(&self) -> &str {
        match self {
            FileOperationKind::Read => "read file",
            FileOperationKind::Write => "write file",
            FileOperationKind::List => "list directory",
            FileOperationKind::Delete => "delete file",
            FileOperationKind::CreateDir => "create directory",
        }
    }

    pub fn target_noun(&self) -> &str {
        match self {
            FileOperationKind::List | FileOperationKind::CreateDir => "directory",
            _ => "file",
        }
    }
}

/// A single operation against the sandbox. `path` is relative to the sandbox root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandleRequest {
    pub path: String,
    pub operation: FileOperationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileHandleRequest {
    pub fn new(operation: FileOperationKind, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation,
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Outcome of one operation, surfaced to the observer and fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperationResult {
    #[serde(rename = "type")]
    pub kind: FileOperationKind,
    pub path: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileOperationResult {
    pub fn succeeded(kind: FileOperationKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            success: true,
            message: Some(message.into()),
            content: None,
        }
    }

    pub fn failed(kind: FileOperationKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            success: false,
            message: Some(message.into()),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Point-in-time snapshot of one sandbox file, used to ground a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    /// Path relative to the sandbox root
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub exists: bool,
}

impl FileContext {
    pub fn present(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            exists: true,
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            exists: false,
        }
    }
}

/// Result of a best-effort tree walk: what was gathered plus how many entries were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedContext {
    pub files: Vec<FileContext>,
    pub skipped: usize,
}

impl CollectedContext {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_serializes_type_field() {
        let result = FileOperationResult::succeeded(FileOperationKind::CreateDir, "tasks", "ok");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "create_dir");
        assert_eq!(json["success"], true);
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_kind_wording() {
        assert_eq!(FileOperationKind::Delete.action(), "delete file");
        assert_eq!(FileOperationKind::List.target_noun(), "directory");
        assert_eq!(FileOperationKind::Write.target_noun(), "file");
    }
}
