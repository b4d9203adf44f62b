//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "recond_config.json";

#[derive(Parser)]
#[command(name = "recond")]
#[command(about = "recond - reconnaissance pipeline orchestrator")]
#[command(
    long_about = r#"recond - reconnaissance pipeline orchestrator

USAGE:
  recond run example.com other.org    # Scan targets to completion
  recond run                          # Resume persisted jobs only
  recond status                       # Show persisted jobs and findings
  recond config init                  # Create a config file
  recond config show                  # Show effective configuration

Scans resume after a crash or ctrl-c: finished steps are never re-run.
For detailed help: recond --help"#
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit targets and run their pipelines to completion
    Run(RunArgs),

    /// Show persisted targets, jobs, and record counts
    Status {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Targets to scan (domains); may be empty to only resume persisted jobs
    pub targets: Vec<String>,

    /// Wordlist for ffuf vhost brute-forcing (stage skipped when absent)
    #[arg(long)]
    pub wordlist: Option<PathBuf>,

    /// Skip the nikto stage for the submitted targets
    #[arg(long)]
    pub skip_nikto: bool,

    /// Path to configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration
    Show {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
    },

    /// Validate a configuration file for errors
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,
    },

    /// Create a new configuration file with defaults
    Init {
        /// Path for the new configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
