//! CLI definitions for bootline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use bootline_core::TraceMode;

/// bootline CLI.
#[derive(Parser)]
#[command(name = "bootline")]
#[command(about = "Boot an application out of services and features")]
#[command(version)]
pub(crate) struct Cli {
    /// Write rolling log files to this directory
    #[arg(long, global = true, env = "BOOTLINE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Boot the demo application (default)
    Run(RunArgs),

    /// List the targets known once services are loaded
    Targets,
}

#[derive(Args, Default)]
pub(crate) struct RunArgs {
    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long, env = "BOOTLINE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Print a boot trace (compact, full)
    #[arg(long)]
    pub trace: Option<TraceMode>,

    /// Initial runtime context, as a JSON object
    #[arg(long)]
    pub context: Option<String>,
}
