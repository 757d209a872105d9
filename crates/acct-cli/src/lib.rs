//! acct-cli library
//!
//! Command parsing, startup and dispatch for the `acct` binary.

pub(crate) mod app;
pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod logger;

#[cfg(test)]
mod tests;

pub use app::{execute, layout_from_config, render, render_error, run};
pub use cli::Cli;
pub use commands::Commands;
pub use error::{CliError, CliResult};
