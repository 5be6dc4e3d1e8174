//! # wabot-cli
//!
//! Argument parsing and command handlers for the `wabot` binary.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use dashboard_client::ClientConfig;
