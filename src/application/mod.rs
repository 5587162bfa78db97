//! # Application Layer
//!
//! Orchestration on top of the infrastructure: the per-turn tool-calling loop,
//! conversation grounding, and logging setup.

pub mod context;
pub mod logging;
pub mod tool_loop;

pub use tool_loop::ToolCallLoop;
