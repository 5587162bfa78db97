//! # taskgrid
//!
//! A sandboxed file-tool broker for an LLM chat:
//! - Domain: Session, Configuration, Errors and Types
//! - Infrastructure: Path guard, File broker, Context collector, OpenRouter client
//! - Application: Tool-call loop, Conversation grounding, Logging
//! - Interface: Command Handlers

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod strings;
