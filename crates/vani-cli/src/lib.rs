//! Terminal front-end for `vani-voice`.
//!
//! Parses the command line, wires a [`PlaybackService`](vani_voice::PlaybackService)
//! to the simulated engine and drives it from an interactive prompt.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use anyhow as _;
use tracing_subscriber as _;

pub mod commands;
pub mod error;
pub mod handlers;
pub mod input;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use commands::Commands;
pub use error::CliError;
pub use input::{InteractiveCommand, parse_command};
pub use parser::Cli;
