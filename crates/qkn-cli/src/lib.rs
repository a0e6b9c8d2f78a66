//! Quantum Knowledge Network CLI library.
//!
//! This library provides the core functionality for the `qkn` command-line
//! client: the client view state machine, the interactive view loop,
//! one-shot commands, configuration management and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;
pub mod view;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use view::ClientView;
