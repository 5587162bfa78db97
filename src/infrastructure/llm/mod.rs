//! # Chat Endpoint
//!
//! Wire types, the fixed file-tool schema, and the HTTP client for an
//! OpenAI-compatible chat-completions endpoint (OpenRouter by default).

mod client;
pub mod schema;
mod types;

pub use client::{ChatCompletion, OpenRouterClient};
pub use schema::{FileTool, file_tools};
pub use types::{
    AssistantReply, ChatMessage, ChatRequest, ChatResponse, FunctionCall, FunctionDefinition,
    TokenUsage, ToolCall, ToolDefinition,
};
