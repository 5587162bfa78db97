//! # Domain Layer
//!
//! Core definitions, types, and traits for the sandboxed file broker.
//! Independent of the filesystem and HTTP implementations, serving as the contract for other layers.

pub mod config;
pub mod error;
pub mod paths;
pub mod session;
pub mod traits;
pub mod types;
