//! Check execution orchestrator.
//!
//! Manages check registration, selection, and sequential execution.
//!
//! # Failure isolation
//!
//! Every selected check produces exactly one evidence record:
//! - Check errors and panics: converted to ERROR records by [`checks::run`]
//! - Invalid check ID: silently ignored in run_specific/run_excluding
//! - Empty selection: returns an empty report (not an error)
//!
//! Checks run one at a time in registration order. There is no early exit.
//!
//! [`checks::run`]: crate::checks::run

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::checks::configuration::{AuthPluginEnabled, ConsumerLimitCoverage, RateLimitPluginEnabled};
use crate::checks::runtime::{
    FreeTierRateLimit, IdentityInjected, InvalidKeyRejected, MissingKeyRejected, ProTierRateLimit,
    ValidKeyAccepted,
};
use crate::checks::{self, ComplianceCheck};
use crate::config::Config;
use crate::engine::result::{Evidence, EvidenceReport, ResultAggregator};
use crate::gateway::{AdminApi, DataPlane};
use crate::CheckCategory;

/// Collaborators and parameters shared by every check.
#[derive(Clone)]
pub struct CheckContext {
    pub admin: Arc<dyn AdminApi>,
    pub dataplane: Arc<dyn DataPlane>,
    pub free_key: String,
    pub pro_key: String,
    pub expected_custom_id: String,
}

impl CheckContext {
    pub fn new(admin: Arc<dyn AdminApi>, dataplane: Arc<dyn DataPlane>, config: &Config) -> Self {
        CheckContext {
            admin,
            dataplane,
            free_key: config.kong.free_trial_key.clone(),
            pro_key: config.kong.pro_key.clone(),
            expected_custom_id: config.kong.expected_custom_id.clone(),
        }
    }
}

/// Check orchestrator
#[derive(Default)]
pub struct CheckOrchestrator {
    checks: Vec<Box<dyn ComplianceCheck>>,
}

impl CheckOrchestrator {
    pub fn new() -> Self {
        CheckOrchestrator { checks: Vec::new() }
    }

    /// Register checks for execution
    pub fn register_checks(&mut self, checks: Vec<Box<dyn ComplianceCheck>>) {
        self.checks.extend(checks);
    }

    /// Register a single check
    pub fn register_check(&mut self, check: Box<dyn ComplianceCheck>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Registered check ids, in execution order
    pub fn check_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.check_id()).collect()
    }

    /// Run all registered checks
    pub fn run_all(&self, observer: &mut dyn FnMut(&Evidence)) -> EvidenceReport {
        self.run_matching(|_| true, observer)
    }

    /// Run checks in a specific category
    pub fn run_category(
        &self,
        category: CheckCategory,
        observer: &mut dyn FnMut(&Evidence),
    ) -> EvidenceReport {
        self.run_matching(|c| c.category() == category, observer)
    }

    /// Run specific checks by ID (case-insensitive)
    pub fn run_specific(
        &self,
        check_ids: &[String],
        observer: &mut dyn FnMut(&Evidence),
    ) -> EvidenceReport {
        self.run_matching(|c| check_ids.iter().any(|id| id.eq_ignore_ascii_case(c.check_id())), observer)
    }

    /// Run all checks except specified IDs (case-insensitive)
    pub fn run_excluding(
        &self,
        skip_ids: &[String],
        observer: &mut dyn FnMut(&Evidence),
    ) -> EvidenceReport {
        self.run_matching(|c| !skip_ids.iter().any(|id| id.eq_ignore_ascii_case(c.check_id())), observer)
    }

    /// Run every registered check accepted by `select`, in registration order.
    ///
    /// `observer` sees each record as soon as it is produced.
    pub fn run_matching<F>(&self, select: F, observer: &mut dyn FnMut(&Evidence)) -> EvidenceReport
    where
        F: Fn(&dyn ComplianceCheck) -> bool,
    {
        let start = Instant::now();
        let mut aggregator = ResultAggregator::new();

        for check in self.checks.iter().filter(|c| select(c.as_ref())) {
            let evidence = checks::run(check.as_ref());
            info!(
                check = evidence.check_id(),
                result = %evidence.result(),
                duration_ms = evidence.duration_ms(),
                "check completed"
            );
            observer(&evidence);
            aggregator.add_result(evidence);
        }

        aggregator.into_report(start.elapsed().as_millis() as u64)
    }
}

/// Build every check in execution order: RT-001..RT-006, then CF-001..CF-003.
pub fn create_all_checks(context: &CheckContext) -> Vec<Box<dyn ComplianceCheck>> {
    let dp = &context.dataplane;
    let admin = &context.admin;

    vec![
        Box::new(FreeTierRateLimit::new(dp.clone(), context.free_key.clone())),
        Box::new(ProTierRateLimit::new(dp.clone(), context.pro_key.clone())),
        Box::new(InvalidKeyRejected::new(dp.clone())),
        Box::new(MissingKeyRejected::new(dp.clone())),
        Box::new(ValidKeyAccepted::new(dp.clone(), context.pro_key.clone())),
        Box::new(IdentityInjected::new(
            dp.clone(),
            context.pro_key.clone(),
            context.expected_custom_id.clone(),
        )),
        Box::new(AuthPluginEnabled::new(admin.clone())),
        Box::new(RateLimitPluginEnabled::new(admin.clone())),
        Box::new(ConsumerLimitCoverage::new(admin.clone())),
    ]
}
