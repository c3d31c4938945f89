//! Tooling
//!
//! Command-line access to the engine for inspecting snapshot exports.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
