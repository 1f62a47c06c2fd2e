//! Dry-run sink: records what would be submitted without any network traffic.

use std::cell::RefCell;

use serde_json::{json, Value};

use super::{EvidenceSink, SinkError, SinkMode, SubmissionPayload};

/// A submission captured by [`DryRunSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSubmission {
    pub monitor_id: String,
    pub payload: SubmissionPayload,
}

pub struct DryRunSink {
    verbose: bool,
    submissions: RefCell<Vec<RecordedSubmission>>,
}

impl DryRunSink {
    pub fn new(verbose: bool) -> Self {
        DryRunSink {
            verbose,
            submissions: RefCell::new(Vec::new()),
        }
    }

    /// Everything submitted so far, in order.
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.borrow().clone()
    }
}

impl EvidenceSink for DryRunSink {
    fn submit(&self, monitor_id: &str, payload: &SubmissionPayload) -> Result<Value, SinkError> {
        if self.verbose {
            let pretty = serde_json::to_string_pretty(payload)?;
            eprintln!("[DRY-RUN] Would submit to monitor {}:", monitor_id);
            eprintln!("{}", pretty);
        }

        let mut submissions = self.submissions.borrow_mut();
        submissions.push(RecordedSubmission {
            monitor_id: monitor_id.to_string(),
            payload: payload.clone(),
        });

        Ok(json!({"status": "mock", "id": format!("mock-{}", submissions.len())}))
    }

    fn health_check(&self) -> bool {
        true
    }

    fn mode(&self) -> SinkMode {
        SinkMode::DryRun
    }
}
