//! Tooling
//!
//! Command-line front end and its text rendering.

pub mod cli;
pub mod format;

pub use cli::{BatchCommands, Cli, CliContext, Commands, FilterArgs};
