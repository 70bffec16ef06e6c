//! Command-line frontend: argument parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};
pub use commands::run_command;
