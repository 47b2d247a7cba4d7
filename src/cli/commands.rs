//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Collect ids of unfinished items from a paginated listing API
#[derive(Parser, Debug)]
#[command(name = "pagesweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page and print the ids of matching items
    Collect(CollectArgs),

    /// Fetch page 1 and print the collection size and page count
    Probe {
        /// Items per page used for planning
        #[arg(long)]
        page_size: Option<u32>,
    },
}

/// Options for `collect`; each one overrides the settings file and environment
#[derive(Args, Debug, Default)]
pub struct CollectArgs {
    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Items per page for the initial probe
    #[arg(long)]
    pub probe_page_size: Option<u32>,

    /// Status code whose items are left out
    #[arg(long)]
    pub excluded_status: Option<i64>,

    /// Abort on the first failed page instead of returning a partial result
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON document with ids, plan and failures
    #[default]
    Json,
    /// One id per line, then a summary
    Pretty,
}
