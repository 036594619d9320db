//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// AgentBoard - status board for coordinated agents
///
/// Reads every per-agent JSON status file in the status directory and
/// writes a Markdown board with active, blocked, idle and completed work.
///
/// Examples:
///   agentboard
///   agentboard --status-dir ./agent-status --output AGENT-STATUS.md
///   agentboard --dry-run
///   agentboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing per-agent status files
    ///
    /// Created with a placeholder record if it does not exist.
    /// Default: from config or `agent-status`.
    #[arg(short = 'd', long, value_name = "DIR", env = "AGENTBOARD_STATUS_DIR")]
    pub status_dir: Option<PathBuf>,

    /// Output file path for the status board
    ///
    /// Default: from config or `AGENT-STATUS.md`.
    #[arg(short, long, value_name = "FILE", env = "AGENTBOARD_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .agentboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of rows in the Recent Completions table
    #[arg(long, value_name = "COUNT")]
    pub recent: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: print the board to stdout instead of writing the output file
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .agentboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
