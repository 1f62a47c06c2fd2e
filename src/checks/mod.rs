//! Compliance check modules.
//!
//! Checks are organized by the gateway surface they probe:
//! - Runtime: live traffic handling on the data-plane (RT-xxx)
//! - Configuration: static gateway configuration via the admin API (CF-xxx)
//!
//! # Failure isolation
//!
//! A check only decides PASS, FAIL or SKIP. Anything that goes wrong while
//! probing (transport errors, non-2xx admin responses, unexpected bodies,
//! panics) is returned or raised from [`ComplianceCheck::execute`] and turned
//! into an ERROR record by [`run`]. No failure escapes `run`.
//!
//! [`install_panic_hook`] keeps panics caught by `run` off stderr; they are
//! logged through `tracing` at debug level and the message lands in the
//! ERROR record. Panics outside `run` reach the previous hook unchanged.

pub mod configuration;
pub mod runtime;

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::engine::result::{utc_timestamp, Artifact, Details, Evidence, Outcome};
use crate::gateway::GatewayError;
use crate::CheckCategory;

/// Failure raised while executing a check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("check panicked: {0}")]
    Panicked(String),
}

/// The decision a check reached, with the raw data that justifies it.
///
/// There is no constructor for [`Outcome::Error`]: errors are
/// expressed as `Err(CheckError)` and recorded by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    result: Outcome,
    details: Details,
    artifacts: Vec<Artifact>,
}

impl CheckOutcome {
    pub fn pass(details: Value, artifacts: Vec<Artifact>) -> Self {
        Self::new(Outcome::Pass, details, artifacts)
    }

    pub fn fail(details: Value, artifacts: Vec<Artifact>) -> Self {
        Self::new(Outcome::Fail, details, artifacts)
    }

    /// PASS when `passed` holds, FAIL otherwise.
    pub fn verdict(passed: bool, details: Value, artifacts: Vec<Artifact>) -> Self {
        if passed {
            Self::pass(details, artifacts)
        } else {
            Self::fail(details, artifacts)
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        let mut details = Details::new();
        details.insert("skip_reason".to_string(), Value::String(reason.into()));
        CheckOutcome {
            result: Outcome::Skip,
            details,
            artifacts: Vec::new(),
        }
    }

    fn new(result: Outcome, details: Value, artifacts: Vec<Artifact>) -> Self {
        let details = match details {
            Value::Object(map) => map,
            Value::Null => Details::new(),
            other => {
                let mut map = Details::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        CheckOutcome {
            result,
            details,
            artifacts,
        }
    }

    pub fn result(&self) -> Outcome {
        self.result
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub(crate) fn into_parts(self) -> (Outcome, Details, Vec<Artifact>) {
        (self.result, self.details, self.artifacts)
    }
}

/// A single compliance probe against the gateway.
pub trait ComplianceCheck {
    /// Stable identifier, unique per check (e.g. "RT-001")
    fn check_id(&self) -> &str;

    /// Human-readable name
    fn check_name(&self) -> &str;

    fn category(&self) -> CheckCategory;

    /// Compliance controls this check substantiates, in display order
    fn control_mapping(&self) -> Vec<String>;

    /// Perform the probe and decide the outcome.
    fn execute(&self) -> Result<CheckOutcome, CheckError>;
}

/// Execute a check and produce its evidence record.
///
/// Captures the start timestamp, times the execution (including failure
/// handling) and converts any error or panic from `execute` into an ERROR
/// record. Always returns exactly one record.
pub fn run(check: &dyn ComplianceCheck) -> Evidence {
    let timestamp = utc_timestamp();
    let start = Instant::now();

    let was_running = RUNNING_CHECK.with(|flag| flag.replace(true));
    let caught = panic::catch_unwind(AssertUnwindSafe(|| check.execute()));
    RUNNING_CHECK.with(|flag| flag.set(was_running));

    let execution = match caught {
        Ok(result) => result,
        Err(payload) => Err(CheckError::Panicked(panic_message(payload.as_ref()))),
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    Evidence::record(
        check.check_id(),
        check.check_name(),
        check.control_mapping(),
        timestamp,
        duration_ms,
        execution,
    )
}

thread_local! {
    static RUNNING_CHECK: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Log panics raised inside [`run`] instead of printing them to stderr.
///
/// Installed once per process; later calls are no-ops.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if RUNNING_CHECK.with(Cell::get) {
                let location = info.location().map(|l| l.to_string()).unwrap_or_default();
                debug!(%location, message = %panic_message(info.payload()), "check panicked");
            } else {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Static description of a check, for listing without building collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub category: CheckCategory,
    pub controls: &'static [&'static str],
}

/// Every check in execution order.
pub fn catalog() -> Vec<CheckInfo> {
    let mut checks = runtime::catalog();
    checks.extend(configuration::catalog());
    checks
}

pub(crate) fn controls(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}
