//! Error types for the file broker and the tool-calling loop.

use thiserror::Error;

use crate::domain::types::FileOperationKind;

/// Result type alias using the broker error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Path failed sandbox validation. No I/O was performed.
    #[error("Invalid {} path: Must be within .taskgrid folder", .kind.target_noun())]
    InvalidPath { kind: FileOperationKind, path: String },

    /// The privileged executor reported a failure
    #[error("Failed to {action}: {message}")]
    FileOperationFailed { action: String, message: String },

    /// No API key or model configured. Raised before any network call.
    #[error("{0}")]
    ConfigurationMissing(String),

    /// Non-success HTTP status, or the request never completed
    #[error("{context} failed: {body}")]
    TransportFailure {
        context: String,
        status: Option<u16>,
        body: String,
    },

    /// The model asked for a tool outside the fixed schema
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Malformed chat response: {0}")]
    MalformedResponse(String),

    #[error("Turn cancelled")]
    Cancelled,
}

impl Error {
    pub fn invalid_path(kind: FileOperationKind, path: impl Into<String>) -> Self {
        Self::InvalidPath {
            kind,
            path: path.into(),
        }
    }

    pub fn file_operation(kind: FileOperationKind, source: impl std::fmt::Display) -> Self {
        Self::FileOperationFailed {
            action: kind.action().to_string(),
            message: source.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationMissing(message.into())
    }

    pub fn transport(context: impl Into<String>, status: Option<u16>, body: impl Into<String>) -> Self {
        Self::TransportFailure {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    /// Relabels a transport failure, e.g. as the follow-up request.
    pub fn in_context(self, context: &str) -> Self {
        match self {
            Self::TransportFailure { status, body, .. } => Self::transport(context, status, body),
            other => other,
        }
    }

    /// Turn-level errors abort the turn; everything else is reported back to the model.
    pub fn aborts_turn(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing(_)
                | Self::TransportFailure { .. }
                | Self::MalformedResponse(_)
                | Self::Cancelled
        )
    }
}
