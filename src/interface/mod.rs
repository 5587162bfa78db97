//! # Interface Layer
//!
//! Entry points a user reaches: the CLI subcommand handlers.

pub mod commands;
