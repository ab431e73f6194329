//! CLI argument definitions.
//!
//! All arguments are defined with clap's derive macros. The main entry
//! point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sitecheck - statewide parcel requirement and exemption calculation.
#[derive(Debug, Parser)]
#[command(name = "sitecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to run configuration (default sitecheck.yml)
    #[arg(short, long, global = true, env = "SITECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Calculate requirements and exemptions (default if no command specified)
    Run(RunArgs),

    /// List registered requirements and exemptions
    List(ListArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Process only these entities (comma-separated, overrides config)
    #[arg(long, value_delimiter = ',')]
    pub entities: Vec<String>,

    /// Calculate only these requirements (comma-separated, overrides config)
    #[arg(long, value_delimiter = ',')]
    pub requirements: Vec<String>,

    /// Skip entities whose output already exists
    #[arg(long)]
    pub resume: bool,

    /// Answer yes to prompts, no interaction
    #[arg(short = 'y', long)]
    pub non_interactive: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// List only requirements
    #[arg(long)]
    pub requirements_only: bool,

    /// List only exemptions
    #[arg(long)]
    pub exemptions_only: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
