//! # Strings Module
//!
//! Centralizes model-facing prompts, result messages, and log lines.

pub mod logs;
pub mod messages;
pub mod prompts;
