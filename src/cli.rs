use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seasonmux")]
#[command(
    author,
    version,
    about = "Merge loose episode tracks into one Matroska file per episode"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that may be given on the command line instead of the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Directory holding the loose episode files
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory merged files are written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base name of the merged files
    #[arg(short = 'f', long = "filename")]
    pub base_name: Option<String>,

    /// Season label used in output names
    #[arg(short, long)]
    pub season: Option<String>,

    /// Number of parallel episode jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Kill an external tool after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge every episode found in the input directory
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Status display
        #[arg(long, value_enum)]
        progress: Option<Progress>,

        /// Print the tool command lines without running them
        #[arg(long)]
        dry_run: bool,

        /// Exit with status 1 if any episode failed
        #[arg(long)]
        strict: bool,
    },

    /// Show the episodes, groups and fonts a run would use
    Scan {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Display version information
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Progress {
    /// Redraw a status table after every update
    Table,
    /// One log line per update
    Log,
}
