//! CLI module
//!
//! Command-line interface for running collections.
//!
//! # Commands
//!
//! - `collect` - Fetch every page and print the matching ids
//! - `probe` - Fetch page 1 and print the planned page count

mod commands;
mod runner;

pub use commands::{Cli, CollectArgs, Commands, OutputFormat};
pub use runner::Runner;
