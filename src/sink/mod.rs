//! Evidence sink adapter.
//!
//! Maps evidence records into the compliance platform's submission shape and
//! dispatches them through an [`EvidenceSink`]. Two sinks exist: the live
//! [`DrataClient`] and the recording [`DryRunSink`]. Which one is used is
//! decided once at startup by [`build_sink`].

pub mod dry_run;
pub mod live;

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::engine::result::{Artifact, Details, Evidence, Outcome};

pub use dry_run::DryRunSink;
pub use live::DrataClient;

/// Errors raised while submitting evidence.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("failed to serialize submission: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Monitor state on the compliance platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorStatus {
    Passing,
    Failing,
}

impl From<Outcome> for MonitorStatus {
    /// Only a PASS counts as passing; ERROR and SKIP are not evidence of compliance.
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Pass => MonitorStatus::Passing,
            Outcome::Fail | Outcome::Error | Outcome::Skip => MonitorStatus::Failing,
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Passing => write!(f, "PASSING"),
            MonitorStatus::Failing => write!(f, "FAILING"),
        }
    }
}

/// Monitor that receives a check's evidence.
pub fn monitor_id(check_id: &str) -> String {
    format!("kong-{}", check_id.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceBody {
    pub details: Details,
    pub artifacts: Vec<Artifact>,
}

/// Submission body sent to the platform for one evidence record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub external_id: String,
    pub name: String,
    pub status: MonitorStatus,
    pub last_tested_at: String,
    pub control_ids: Vec<String>,
    pub evidence: EvidenceBody,
}

impl SubmissionPayload {
    /// Pure mapping from an evidence record; the same record always maps to the same payload.
    pub fn from_evidence(evidence: &Evidence) -> Self {
        SubmissionPayload {
            external_id: evidence.check_id().to_string(),
            name: evidence.check_name().to_string(),
            status: MonitorStatus::from(evidence.result()),
            last_tested_at: evidence.timestamp().to_string(),
            control_ids: evidence.control_mapping().to_vec(),
            evidence: EvidenceBody {
                details: evidence.details().clone(),
                artifacts: evidence.artifacts().to_vec(),
            },
        }
    }
}

/// How submissions are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Live,
    DryRun,
}

impl fmt::Display for SinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkMode::Live => write!(f, "live"),
            SinkMode::DryRun => write!(f, "dry-run"),
        }
    }
}

/// Destination for evidence submissions.
pub trait EvidenceSink {
    /// Submit one payload to a monitor, returning the platform's receipt.
    fn submit(&self, monitor_id: &str, payload: &SubmissionPayload) -> Result<Value, SinkError>;

    /// Whether the platform is reachable. Never fails.
    fn health_check(&self) -> bool;

    fn mode(&self) -> SinkMode;
}

/// Result of submitting one evidence record.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub check_id: String,
    pub monitor_id: String,
    pub status: MonitorStatus,
    pub outcome: Result<Value, String>,
}

impl SubmissionRecord {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-record outcomes of a batch submission.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub mode: SinkMode,
    pub records: Vec<SubmissionRecord>,
}

impl SubmissionReport {
    pub fn submitted(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.submitted()
    }
}

/// Submit every record in order. A failed submission is logged and recorded;
/// the remaining records are still submitted.
pub fn submit_all(sink: &dyn EvidenceSink, results: &[Evidence]) -> SubmissionReport {
    let mut records = Vec::with_capacity(results.len());

    for evidence in results {
        let monitor = monitor_id(evidence.check_id());
        let payload = SubmissionPayload::from_evidence(evidence);

        let outcome = match sink.submit(&monitor, &payload) {
            Ok(receipt) => {
                info!(check = evidence.check_id(), monitor = %monitor, status = %payload.status, "evidence submitted");
                Ok(receipt)
            }
            Err(e) => {
                warn!(check = evidence.check_id(), monitor = %monitor, error = %e, "evidence submission failed");
                Err(e.to_string())
            }
        };

        records.push(SubmissionRecord {
            check_id: evidence.check_id().to_string(),
            monitor_id: monitor,
            status: payload.status,
            outcome,
        });
    }

    SubmissionReport {
        mode: sink.mode(),
        records,
    }
}

/// Pick the sink for this run: dry-run records locally, live requires an API key.
pub fn build_sink(config: &Config) -> Result<Box<dyn EvidenceSink>, ConfigError> {
    if config.dry_run {
        return Ok(Box::new(DryRunSink::new(config.verbose)));
    }

    let api_key = config.drata_api_key()?;
    DrataClient::new(api_key, &config.drata.api_base, config.request_timeout())
        .map(|client| Box::new(client) as Box<dyn EvidenceSink>)
        .map_err(|e| ConfigError::Invalid {
            name: "DRATA_API_BASE",
            reason: e.to_string(),
        })
}
