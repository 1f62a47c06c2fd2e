//! Full run integration tests.
//!
//! Tests for complete compliance runs, including orchestration, selection,
//! failure isolation, export, and result aggregation.

use std::sync::Arc;

use serde_json::Value;

use gateway_evidence::checks::{CheckError, CheckOutcome, ComplianceCheck};
use gateway_evidence::engine::orchestrator::{create_all_checks, CheckOrchestrator};
use gateway_evidence::engine::result::{Evidence, Outcome, ResultAggregator};
use gateway_evidence::{run_checks, CheckCategory, RunOptions};

use crate::mocks::{mock_context, MockAdmin, MockDataPlane, MockDataPlaneConfig};

const ALL_IDS: [&str; 9] = [
    "RT-001", "RT-002", "RT-003", "RT-004", "RT-005", "RT-006", "CF-001", "CF-002", "CF-003",
];

fn outcomes(results: &[Evidence]) -> Vec<(&str, Outcome)> {
    results.iter().map(|e| (e.check_id(), e.result())).collect()
}

fn result_of(results: &[Evidence], id: &str) -> Outcome {
    results
        .iter()
        .find(|e| e.check_id() == id)
        .map(|e| e.result())
        .unwrap_or_else(|| panic!("{} missing from results", id))
}

#[test]
fn test_compliant_gateway_all_pass() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    let ids: Vec<_> = report.results.iter().map(|e| e.check_id()).collect();
    assert_eq!(ids, ALL_IDS);
    assert!(
        report.results.iter().all(|e| e.result() == Outcome::Pass),
        "unexpected outcomes: {:?}",
        outcomes(&report.results)
    );

    let summary = report.summary();
    assert_eq!(summary.total, 9);
    assert_eq!(summary.passed, 9);
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_missing_rate_limits_fail_runtime_check() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::no_rate_limit());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    assert_eq!(result_of(&report.results, "RT-001"), Outcome::Fail);
    assert_eq!(result_of(&report.results, "RT-002"), Outcome::Pass);
    let rt001 = report.get("RT-001").unwrap();
    assert_eq!(rt001.details()["rate_limit_triggered"], false);
    assert_eq!(report.summary().exit_code(), 1);
}

#[test]
fn test_open_gateway_fails_key_checks() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::open_gateway());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    assert_eq!(result_of(&report.results, "RT-003"), Outcome::Fail);
    assert_eq!(result_of(&report.results, "RT-004"), Outcome::Fail);
    assert_eq!(report.get("RT-004").unwrap().details()["actual_status"], 200);
}

#[test]
fn test_wrong_identity_fails_rt006() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::wrong_identity());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    let rt006 = report.get("RT-006").unwrap();
    assert_eq!(rt006.result(), Outcome::Fail);
    assert_eq!(rt006.details()["actual_custom_id"], "tier_free");
    assert_eq!(rt006.details()["expected_custom_id"], "tier_pro");
}

#[test]
fn test_uncovered_consumer_reported_by_username() {
    let context = mock_context(MockAdmin::uncovered_consumer(), MockDataPlaneConfig::compliant());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    let cf003 = report.get("CF-003").unwrap();
    assert_eq!(cf003.result(), Outcome::Fail);
    assert_eq!(cf003.details()["missing_limits"], serde_json::json!(["new-partner"]));
    assert_eq!(cf003.details()["coverage_percent"], 66.7);
    assert_eq!(result_of(&report.results, "CF-002"), Outcome::Pass);
}

#[test]
fn test_empty_control_plane_fails_configuration_checks() {
    let context = mock_context(MockAdmin::empty(), MockDataPlaneConfig::compliant());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    for id in ["CF-001", "CF-002", "CF-003"] {
        assert_eq!(result_of(&report.results, id), Outcome::Fail, "{}", id);
    }
}

#[test]
fn test_outages_become_errors_not_aborts() {
    let context = mock_context(MockAdmin::unavailable(), MockDataPlaneConfig::unreachable());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    assert_eq!(report.results.len(), 9);
    for evidence in &report.results {
        assert!(
            matches!(evidence.result(), Outcome::Fail | Outcome::Error),
            "{} was {}",
            evidence.check_id(),
            evidence.result()
        );
        assert_eq!(
            evidence.error_message().is_some(),
            evidence.result() == Outcome::Error,
            "error_message must be present exactly for ERROR ({})",
            evidence.check_id()
        );
    }

    assert_eq!(result_of(&report.results, "RT-003"), Outcome::Error);
    assert_eq!(result_of(&report.results, "CF-001"), Outcome::Error);
    // The burst checks tolerate transport failures and record status 0.
    let rt001 = report.get("RT-001").unwrap();
    assert_eq!(rt001.result(), Outcome::Fail);
    assert_eq!(rt001.artifacts()[0].payload(), &serde_json::json!([0, 0, 0, 0, 0, 0, 0, 0]));

    let summary = report.summary();
    assert_eq!(summary.passed + summary.failed + summary.errors + summary.skipped, summary.total);
    assert!(summary.is_failure());
}

#[test]
fn test_observer_sees_every_record_in_order() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let mut seen = Vec::new();
    let report = run_checks(&context, &RunOptions::default(), &mut |e| {
        seen.push(e.check_id().to_string())
    });

    assert_eq!(seen, ALL_IDS);
    assert_eq!(seen.len(), report.results.len());
}

#[test]
fn test_category_selection() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let options = RunOptions {
        category: Some(CheckCategory::Configuration),
        ..Default::default()
    };
    let report = run_checks(&context, &options, &mut |_| {});

    let ids: Vec<_> = report.results.iter().map(|e| e.check_id()).collect();
    assert_eq!(ids, ["CF-001", "CF-002", "CF-003"]);
}

#[test]
fn test_only_and_skip_selection() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let options = RunOptions {
        only_checks: vec!["rt-003".to_string(), "CF-001".to_string(), "XX-999".to_string()],
        skip_checks: vec!["CF-001".to_string()],
        ..Default::default()
    };
    let report = run_checks(&context, &options, &mut |_| {});

    let ids: Vec<_> = report.results.iter().map(|e| e.check_id()).collect();
    assert_eq!(ids, ["RT-003"]);
}

#[test]
fn test_runtime_probes_use_expected_keys() {
    let dataplane = Arc::new(MockDataPlane::new(MockDataPlaneConfig::compliant()));
    let mut context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    context.dataplane = dataplane.clone();

    let options = RunOptions {
        category: Some(CheckCategory::Runtime),
        ..Default::default()
    };
    run_checks(&context, &options, &mut |_| {});

    let requests = dataplane.requests();
    // 8 free + 10 pro + invalid + missing + health + whoami
    assert_eq!(requests.len(), 22);
    assert!(requests[..8].iter().all(|(p, k)| p == "/api/hello" && k.as_deref() == Some("free-trial-key")));
    assert_eq!(requests[18].1.as_deref(), Some("invalid-key-12345"));
    assert_eq!(requests[19].1, None);
    assert_eq!(requests[20].0, "/api/health");
    assert_eq!(requests[21].0, "/api/whoami");
}

#[test]
fn test_export_document_shape() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evidence.json");
    report.write_export(&path).unwrap();

    let exported: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(exported["timestamp"].is_string());

    let results = exported["results"].as_array().unwrap();
    assert_eq!(results.len(), 9);
    let first = &results[0];
    assert_eq!(first["check_id"], "RT-001");
    assert_eq!(first["result"], "PASS");
    assert_eq!(first["control_mapping"], serde_json::json!(["CC6.1", "CC6.3", "CC7.2"]));
    assert_eq!(first["artifacts"][0]["type"], "test_results");
    assert!(first["error_message"].is_null());

    // Detail keys keep their insertion order.
    let keys: Vec<_> = first["details"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys[0], "api_key");
    assert_eq!(keys.last().map(String::as_str), Some("rate_limit_triggered"));
}

#[test]
fn test_export_to_missing_directory_fails() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let options = RunOptions {
        only_checks: vec!["CF-001".to_string()],
        ..Default::default()
    };
    let report = run_checks(&context, &options, &mut |_| {});

    let dir = tempfile::tempdir().unwrap();
    let err = report
        .write_export(&dir.path().join("missing").join("evidence.json"))
        .unwrap_err();
    assert!(err.to_string().contains("failed to write export"));
}

struct Exploding;

impl ComplianceCheck for Exploding {
    fn check_id(&self) -> &str {
        "XX-001"
    }

    fn check_name(&self) -> &str {
        "Exploding check"
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        vec!["CC7.2".to_string()]
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        panic!("index out of bounds");
    }
}

#[test]
fn test_panicking_check_among_real_checks() {
    let context = mock_context(MockAdmin::compliant(), MockDataPlaneConfig::compliant());
    let mut orchestrator = CheckOrchestrator::new();
    orchestrator.register_check(Box::new(Exploding));
    orchestrator.register_checks(create_all_checks(&context));

    let report = orchestrator.run_all(&mut |_| {});

    assert_eq!(report.results.len(), 10);
    let exploded = &report.results[0];
    assert_eq!(exploded.result(), Outcome::Error);
    assert_eq!(exploded.error_message(), Some("check panicked: index out of bounds"));
    assert_eq!(exploded.control_mapping(), ["CC7.2"]);
    assert!(report.results[1..].iter().all(|e| e.result() == Outcome::Pass));
}

#[test]
fn test_aggregator_failures() {
    let context = mock_context(MockAdmin::empty(), MockDataPlaneConfig::compliant());
    let report = run_checks(&context, &RunOptions::default(), &mut |_| {});

    let mut aggregator = ResultAggregator::new();
    for evidence in report.results {
        aggregator.add_result(evidence);
    }

    assert!(aggregator.has_failures());
    let failed: Vec<_> = aggregator.failures().iter().map(|e| e.check_id().to_string()).collect();
    assert_eq!(failed, ["CF-001", "CF-002", "CF-003"]);

    let report = aggregator.into_report(42);
    assert_eq!(report.total_duration_ms, 42);
    assert_eq!(report.summary().failed, 3);
}
