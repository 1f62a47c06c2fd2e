//! Command line arguments for gateway-evidence.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::version;

/// Command to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Subcommand)]
pub enum Command {
    /// Run the checks and submit evidence (default)
    #[default]
    Run,
    /// List all available checks
    List,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
    /// JUnit XML for CI/CD integration
    Junit,
}

/// Check category filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CategoryFilter {
    #[default]
    All,
    Runtime,
    Configuration,
}

/// Compliance evidence harness for a Kong API gateway.
///
/// Connection settings are read from the environment (KONNECT_TOKEN,
/// DATAPLANE_URL, DRATA_API_KEY, ...).
#[derive(Debug, Clone, Parser)]
#[command(name = "gateway-evidence", version, long_version = version::LONG_VERSION)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Record evidence locally instead of submitting it to Drata
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Include details, per-check timings and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write the evidence export document to FILE
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print failures and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Run only this check (repeatable)
    #[arg(long = "only", value_name = "ID", global = true)]
    pub only: Vec<String>,

    /// Skip this check (repeatable)
    #[arg(long = "skip", value_name = "ID", global = true)]
    pub skip: Vec<String>,

    /// Run only one category of checks
    #[arg(long, value_enum, default_value_t = CategoryFilter::All, global = true)]
    pub category: CategoryFilter,
}

impl Args {
    /// The selected command; `run` when none is given.
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }

    /// Color is used unless disabled by flag or the NO_COLOR convention.
    pub fn color(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }
}
