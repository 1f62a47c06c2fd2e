//! Evidence records and result aggregation.
//!
//! Every executed check yields exactly one [`Evidence`] record. Records are
//! immutable once built; the aggregator collects them in execution order and
//! produces the [`EvidenceReport`] that is printed, exported, and submitted.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::checks::{CheckError, CheckOutcome};
use crate::HarnessError;

/// Free-form, string-keyed audit context attached to a record.
pub type Details = Map<String, Value>;

/// Terminal outcome of a single check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
    Skip,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
            Outcome::Error => "ERROR",
            Outcome::Skip => "SKIP",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured piece of raw evidence (response snapshot, config snapshot, status list).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    kind: String,
    description: String,
    #[serde(rename = "data")]
    payload: Value,
}

impl Artifact {
    pub fn new(kind: impl Into<String>, description: impl Into<String>, payload: Value) -> Self {
        Artifact {
            kind: kind.into(),
            description: description.into(),
            payload,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// The canonical, platform-independent audit record for one check execution.
///
/// Fields are private: the only way to build a record is [`Evidence::record`],
/// which guarantees that `error_message` is present exactly when the outcome
/// is [`Outcome::Error`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    check_id: String,
    check_name: String,
    timestamp: String,
    result: Outcome,
    control_mapping: Vec<String>,
    duration_ms: u64,
    details: Details,
    artifacts: Vec<Artifact>,
    error_message: Option<String>,
}

impl Evidence {
    /// Build a record from the result of a check execution.
    ///
    /// A successful execution keeps its outcome, details and artifacts. A
    /// failed execution becomes an `ERROR` record with empty details and
    /// artifacts and the failure text as `error_message`.
    pub fn record(
        check_id: impl Into<String>,
        check_name: impl Into<String>,
        control_mapping: Vec<String>,
        timestamp: String,
        duration_ms: u64,
        execution: Result<CheckOutcome, CheckError>,
    ) -> Self {
        let (result, details, artifacts, error_message) = match execution {
            Ok(outcome) => {
                let (result, details, artifacts) = outcome.into_parts();
                (result, details, artifacts, None)
            }
            Err(e) => (Outcome::Error, Details::new(), Vec::new(), Some(e.to_string())),
        };

        Evidence {
            check_id: check_id.into(),
            check_name: check_name.into(),
            timestamp,
            result,
            control_mapping,
            duration_ms,
            details,
            artifacts,
            error_message,
        }
    }

    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn result(&self) -> Outcome {
        self.result
    }

    pub fn control_mapping(&self) -> &[String] {
        &self.control_mapping
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Result summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    pub skipped: u32,
    pub total_duration_ms: u64,
}

impl ResultSummary {
    /// Summarize a sequence of records.
    pub fn from_results(results: &[Evidence]) -> Self {
        let mut summary = ResultSummary::default();

        for evidence in results {
            summary.total += 1;
            summary.total_duration_ms += evidence.duration_ms();

            match evidence.result() {
                Outcome::Pass => summary.passed += 1,
                Outcome::Fail => summary.failed += 1,
                Outcome::Error => summary.errors += 1,
                Outcome::Skip => summary.skipped += 1,
            }
        }

        summary
    }

    /// True when the run must be reported as failed to the invoking environment.
    pub fn is_failure(&self) -> bool {
        self.failed + self.errors > 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_failure() {
            1
        } else {
            0
        }
    }
}

/// All evidence produced by one run, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceReport {
    pub timestamp: String,
    pub results: Vec<Evidence>,
    pub total_duration_ms: u64,
}

impl EvidenceReport {
    /// Create a new empty report stamped with the current time
    pub fn new() -> Self {
        EvidenceReport {
            timestamp: utc_timestamp(),
            results: Vec::new(),
            total_duration_ms: 0,
        }
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    pub fn get(&self, check_id: &str) -> Option<&Evidence> {
        self.results.iter().find(|e| e.check_id() == check_id)
    }

    /// The structured export document for this report.
    pub fn to_export(&self) -> ExportDocument<'_> {
        ExportDocument {
            timestamp: utc_timestamp(),
            results: &self.results,
        }
    }

    /// Serialize the export document as pretty JSON and write it to `path`.
    pub fn write_export(&self, path: &Path) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(&self.to_export())?;
        std::fs::write(path, json).map_err(|source| HarnessError::Export {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Default for EvidenceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Export shape: `{timestamp, results}`.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub timestamp: String,
    pub results: &'a [Evidence],
}

/// Result aggregator for collecting evidence records
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<Evidence>,
    started_at: Option<String>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        ResultAggregator {
            results: Vec::new(),
            started_at: Some(utc_timestamp()),
        }
    }

    /// Add a completed record
    pub fn add_result(&mut self, evidence: Evidence) {
        self.results.push(evidence);
    }

    pub fn has_failures(&self) -> bool {
        self.summary().is_failure()
    }

    /// Records whose outcome is FAIL or ERROR
    pub fn failures(&self) -> Vec<&Evidence> {
        self.results
            .iter()
            .filter(|e| matches!(e.result(), Outcome::Fail | Outcome::Error))
            .collect()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    /// Create the final report
    pub fn into_report(self, total_duration_ms: u64) -> EvidenceReport {
        EvidenceReport {
            timestamp: self.started_at.unwrap_or_else(utc_timestamp),
            results: self.results,
            total_duration_ms,
        }
    }
}

/// Current UTC time as an RFC 3339 string.
pub fn utc_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
