//! # Command Handlers
//!
//! One handler per CLI subcommand (`chat`, `context`, `tools`).
//! These handlers are invoked from `main`.

pub mod chat;
pub mod context;
pub mod tools;
