//! Output formatting for gateway-evidence.
//!
//! Provides terminal, JSON, and JUnit XML output formatters, plus the
//! per-check progress line and the submission summary.
//!
//! All formatters produce valid output for any EvidenceReport input,
//! including an empty one. No function in this module will panic.

use serde::Serialize;
use serde_json::Value;

use crate::checks::{self, CheckInfo};
use crate::cli::args::OutputFormat;
use crate::engine::result::{Evidence, EvidenceReport, Outcome, ResultSummary};
use crate::sink::{SinkMode, SubmissionReport};
use crate::CheckCategory;

const RULE: &str = "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format an evidence report into a string
    fn format(&self, report: &EvidenceReport) -> String;
}

/// Category of a known check id; unknown ids have none.
fn category_of(check_id: &str) -> Option<CheckCategory> {
    checks::catalog()
        .into_iter()
        .find(|c| c.id == check_id)
        .map(|c| c.category)
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn status(&self, outcome: Outcome) -> String {
        let label = format!("[{}]", outcome);
        match outcome {
            Outcome::Pass => self.colorize(&label, "32"),
            Outcome::Fail => self.colorize(&label, "31"),
            Outcome::Error => self.colorize(&label, "35"),
            Outcome::Skip => self.colorize(&label, "90"),
        }
    }

    fn is_issue(evidence: &Evidence) -> bool {
        matches!(evidence.result(), Outcome::Fail | Outcome::Error)
    }

    /// One line printed as soon as a check finishes.
    pub fn progress_line(&self, evidence: &Evidence) -> String {
        let mut line = format!(
            "{} {}: {}",
            self.status(evidence.result()),
            evidence.check_id(),
            evidence.check_name()
        );
        if self.verbose {
            line.push_str(&format!(" ({}ms)", evidence.duration_ms()));
        }
        if let Some(message) = evidence.error_message() {
            line.push_str(&format!(" - {}", message));
        }
        line
    }

    fn format_check(&self, evidence: &Evidence, output: &mut String) {
        output.push_str(&format!("  {}\n", self.progress_line(evidence)));

        if !self.verbose {
            return;
        }

        output.push_str(&format!(
            "      controls: {}\n",
            evidence.control_mapping().join(", ")
        ));
        for (key, value) in evidence.details() {
            output.push_str(&format!("      {}: {}\n", key, compact(value)));
        }
        for artifact in evidence.artifacts() {
            output.push_str(&format!(
                "      artifact [{}] {}\n",
                artifact.kind(),
                artifact.description()
            ));
        }
    }
}

/// Single-line JSON rendering for detail values.
fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &EvidenceReport) -> String {
        let mut output = String::new();

        // Header
        output.push_str(RULE);
        output.push('\n');
        output.push_str("gateway-evidence compliance report\n");
        output.push_str(&format!("Timestamp: {}\n", report.timestamp));
        output.push_str(RULE);
        output.push_str("\n\n");

        let groups: [(&str, Option<CheckCategory>); 3] = [
            ("RUNTIME CHECKS", Some(CheckCategory::Runtime)),
            ("CONFIGURATION CHECKS", Some(CheckCategory::Configuration)),
            ("OTHER CHECKS", None),
        ];

        for (header, category) in groups {
            let group: Vec<&Evidence> = report
                .results
                .iter()
                .filter(|e| category_of(e.check_id()) == category)
                .filter(|e| !self.quiet || Self::is_issue(e))
                .collect();

            if group.is_empty() {
                continue;
            }

            output.push_str(header);
            output.push('\n');
            for evidence in group {
                self.format_check(evidence, &mut output);
            }
            output.push('\n');
        }

        // Summary
        let summary = report.summary();
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} passed, {} failed, {} errors, {} skipped\n",
            summary.passed, summary.failed, summary.errors, summary.skipped
        ));
        output.push_str(&format!(
            "Total time: {:.1}s\n",
            report.total_duration_ms as f64 / 1000.0
        ));

        let exit_desc = if summary.is_failure() {
            "failures detected"
        } else {
            "all checks passed"
        };
        output.push_str(&format!("Exit code: {} ({})\n", summary.exit_code(), exit_desc));
        output.push_str(RULE);

        output
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    timestamp: &'a str,
    total_duration_ms: u64,
    summary: ResultSummary,
    results: &'a [Evidence],
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &EvidenceReport) -> String {
        let document = JsonReport {
            timestamp: &report.timestamp,
            total_duration_ms: report.total_duration_ms,
            summary: report.summary(),
            results: &report.results,
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

/// JUnit XML formatter
#[derive(Default)]
pub struct JunitFormatter;

impl JunitFormatter {
    pub fn new() -> Self {
        JunitFormatter
    }

    fn escape_xml(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                '"' => result.push_str("&quot;"),
                '\'' => result.push_str("&apos;"),
                c => result.push(c),
            }
        }
        result
    }

    fn seconds(ms: u64) -> f64 {
        ms as f64 / 1000.0
    }
}

impl OutputFormatter for JunitFormatter {
    fn format(&self, report: &EvidenceReport) -> String {
        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let summary = report.summary();
        output.push_str(&format!(
            "<testsuites name=\"gateway-evidence\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">\n",
            summary.total,
            summary.failed,
            summary.errors,
            summary.skipped,
            Self::seconds(report.total_duration_ms)
        ));

        let suites: [(&str, Option<CheckCategory>); 3] = [
            ("runtime", Some(CheckCategory::Runtime)),
            ("configuration", Some(CheckCategory::Configuration)),
            ("other", None),
        ];

        for (suite_name, category) in suites {
            let cases: Vec<&Evidence> = report
                .results
                .iter()
                .filter(|e| category_of(e.check_id()) == category)
                .collect();

            if cases.is_empty() {
                continue;
            }

            let count = |outcome: Outcome| cases.iter().filter(|e| e.result() == outcome).count();
            let suite_time: u64 = cases.iter().map(|e| e.duration_ms()).sum();

            output.push_str(&format!(
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">\n",
                suite_name,
                cases.len(),
                count(Outcome::Fail),
                count(Outcome::Error),
                count(Outcome::Skip),
                Self::seconds(suite_time)
            ));

            for evidence in cases {
                output.push_str(&format!(
                    "    <testcase name=\"{}\" classname=\"gateway-evidence.{}\" time=\"{:.3}\">\n",
                    Self::escape_xml(&format!("{} {}", evidence.check_id(), evidence.check_name())),
                    suite_name,
                    Self::seconds(evidence.duration_ms())
                ));

                let details = Value::Object(evidence.details().clone()).to_string();
                match evidence.result() {
                    Outcome::Pass => {
                        output.push_str(&format!(
                            "      <system-out>{}</system-out>\n",
                            Self::escape_xml(&details)
                        ));
                    }
                    Outcome::Fail => {
                        output.push_str(&format!(
                            "      <failure message=\"{}\">{}</failure>\n",
                            Self::escape_xml(evidence.check_name()),
                            Self::escape_xml(&details)
                        ));
                    }
                    Outcome::Error => {
                        output.push_str(&format!(
                            "      <error message=\"{}\" />\n",
                            Self::escape_xml(evidence.error_message().unwrap_or("unknown error"))
                        ));
                    }
                    Outcome::Skip => {
                        let reason = evidence
                            .details()
                            .get("skip_reason")
                            .and_then(Value::as_str)
                            .unwrap_or("skipped");
                        output.push_str(&format!(
                            "      <skipped message=\"{}\" />\n",
                            Self::escape_xml(reason)
                        ));
                    }
                }

                output.push_str("    </testcase>\n");
            }

            output.push_str("  </testsuite>\n");
        }

        output.push_str("</testsuites>");
        output
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(
    format: OutputFormat,
    color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(color, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Junit => Box::new(JunitFormatter::new()),
    }
}

/// Summary of what the evidence sink did with each record.
pub fn format_submissions(report: &SubmissionReport) -> String {
    let mut output = String::new();

    let verb = match report.mode {
        SinkMode::Live => "Submitted",
        SinkMode::DryRun => "Recorded (dry-run)",
    };
    output.push_str(&format!(
        "{} {}/{} evidence records",
        verb,
        report.submitted(),
        report.records.len()
    ));

    for record in report.records.iter().filter(|r| !r.is_success()) {
        if let Err(message) = &record.outcome {
            output.push_str(&format!(
                "\n  {} -> {}: {}",
                record.check_id, record.monitor_id, message
            ));
        }
    }

    output
}

/// Table of available checks for the `list` command.
pub fn format_catalog(checks: &[CheckInfo]) -> String {
    let mut output = String::from("Available checks:\n");

    for category in [CheckCategory::Runtime, CheckCategory::Configuration] {
        output.push('\n');
        output.push_str(&format!("{} CHECKS:\n", category.to_string().to_uppercase()));
        for check in checks.iter().filter(|c| c.category == category) {
            output.push_str(&format!(
                "  {:<8} {}  [{}]\n",
                check.id,
                check.name,
                check.controls.join(", ")
            ));
        }
    }

    output
}
