//! # Tools Module
//!
//! Sandboxed file access: the textual path guard, the privileged executor,
//! the validated broker in front of it, and the context collector.

pub mod broker;
pub mod context;
pub mod executor;
pub mod guard;

pub use broker::FileBroker;
pub use context::ContextCollector;
pub use executor::LocalExecutor;
pub use guard::PathGuard;
