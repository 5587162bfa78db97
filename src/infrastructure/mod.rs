//! # Infrastructure Layer
//!
//! Handles interactions with external systems: the filesystem and the chat endpoint.
//! Implements the traits defined in the Domain layer (e.g., FileExecutor).

pub mod llm;
pub mod tools;
