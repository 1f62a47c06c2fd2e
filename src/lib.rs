//! gateway-evidence library
//!
//! Compliance evidence harness for a Kong API gateway.
//!
//! This library runs a fixed suite of checks against a Kong deployment and
//! turns every outcome into an auditable evidence record:
//! - Runtime checks probe the data-plane (rate limits, API key enforcement, identity injection)
//! - Configuration checks audit the Konnect control plane (plugins, consumer coverage)
//! - Evidence records are exported as JSON and submitted to Drata, or recorded in dry-run mode
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gateway_evidence::config::Config;
//! use gateway_evidence::engine::orchestrator::CheckContext;
//! use gateway_evidence::gateway::{DataplaneClient, KonnectClient};
//! use gateway_evidence::{run_checks, RunOptions};
//!
//! let config = Config::from_env().expect("configuration");
//! let admin = KonnectClient::new(
//!     &config.kong.konnect_token,
//!     config.kong.konnect_api_base(),
//!     &config.kong.control_plane_name,
//!     config.request_timeout(),
//! )
//! .expect("konnect client");
//! let dataplane = DataplaneClient::new(&config.kong.dataplane_url, config.request_timeout())
//!     .expect("dataplane client");
//!
//! let context = CheckContext::new(Arc::new(admin), Arc::new(dataplane), &config);
//! let report = run_checks(&context, &RunOptions::default(), &mut |_| {});
//! println!("Checks passed: {}", report.summary().passed);
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod sink;
pub mod version;

use std::fmt;
use std::io;

use thiserror::Error;

use cli::args::{Args, CategoryFilter};
use engine::orchestrator::{create_all_checks, CheckContext, CheckOrchestrator};
use engine::result::{Evidence, EvidenceReport};

// Re-exports for public API
pub use checks::{run, CheckError, CheckOutcome, ComplianceCheck};
pub use engine::result::{Outcome, ResultSummary};

/// Check category for grouping related checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckCategory {
    /// Live data-plane behavior (rate limits, authentication, identity)
    Runtime,
    /// Declared gateway configuration read from the admin API
    Configuration,
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckCategory::Runtime => write!(f, "Runtime"),
            CheckCategory::Configuration => write!(f, "Configuration"),
        }
    }
}

/// Error types for gateway-evidence operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Gateway(#[from] gateway::GatewayError),
    #[error(transparent)]
    Sink(#[from] sink::SinkError),
    #[error("failed to write export to {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Which checks to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Restrict to one category (None = all)
    pub category: Option<CheckCategory>,
    /// Specific checks to skip (by ID)
    pub skip_checks: Vec<String>,
    /// Specific checks to run (by ID); empty means no restriction
    pub only_checks: Vec<String>,
}

impl RunOptions {
    /// Create options from command line arguments
    pub fn from_args(args: &Args) -> Self {
        let category = match args.category {
            CategoryFilter::All => None,
            CategoryFilter::Runtime => Some(CheckCategory::Runtime),
            CategoryFilter::Configuration => Some(CheckCategory::Configuration),
        };

        RunOptions {
            category,
            skip_checks: args.skip.clone(),
            only_checks: args.only.clone(),
        }
    }

    /// Whether a check passes all filters. Ids compare case-insensitively.
    pub fn selects(&self, check_id: &str, category: CheckCategory) -> bool {
        let matches = |ids: &[String]| ids.iter().any(|id| id.eq_ignore_ascii_case(check_id));

        (self.only_checks.is_empty() || matches(&self.only_checks))
            && !matches(&self.skip_checks)
            && self.category.map_or(true, |c| c == category)
    }
}

/// Run the compliance checks.
///
/// This is the main entry point: builds every check from `context`, runs the
/// ones selected by `options` in order, and reports each record to
/// `observer` as soon as it is produced.
pub fn run_checks(
    context: &CheckContext,
    options: &RunOptions,
    observer: &mut dyn FnMut(&Evidence),
) -> EvidenceReport {
    let mut orchestrator = CheckOrchestrator::new();
    orchestrator.register_checks(create_all_checks(context));
    orchestrator.run_matching(|c| options.selects(c.check_id(), c.category()), observer)
}
