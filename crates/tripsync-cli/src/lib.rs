//! CLI: argument parsing, configuration, daemon wiring.
//!
//! This crate provides the `tripsync` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
