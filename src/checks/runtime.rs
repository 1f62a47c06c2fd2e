//! Runtime checks (RT-001 through RT-006).
//!
//! Probe the live data-plane to confirm that rate limiting, API key
//! authentication and consumer identity injection are enforced.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{controls, CheckError, CheckInfo, CheckOutcome, ComplianceCheck};
use crate::engine::result::Artifact;
use crate::gateway::DataPlane;
use crate::CheckCategory;

/// Path used for rate-limit and authentication probes
pub const PROBE_PATH: &str = "/api/hello";

/// Syntactically valid key that is not registered with the gateway
pub const UNREGISTERED_KEY: &str = "invalid-key-12345";

const RATE_LIMIT_CONTROLS: &[&str] = &["CC6.1", "CC6.3", "CC7.2"];
const KEY_REJECTION_CONTROLS: &[&str] = &["CC6.1", "CC6.6"];

/// Get all runtime checks metadata
pub fn catalog() -> Vec<CheckInfo> {
    vec![
        CheckInfo {
            id: FreeTierRateLimit::ID,
            name: FreeTierRateLimit::NAME,
            category: CheckCategory::Runtime,
            controls: RATE_LIMIT_CONTROLS,
        },
        CheckInfo {
            id: ProTierRateLimit::ID,
            name: ProTierRateLimit::NAME,
            category: CheckCategory::Runtime,
            controls: RATE_LIMIT_CONTROLS,
        },
        CheckInfo {
            id: InvalidKeyRejected::ID,
            name: InvalidKeyRejected::NAME,
            category: CheckCategory::Runtime,
            controls: KEY_REJECTION_CONTROLS,
        },
        CheckInfo {
            id: MissingKeyRejected::ID,
            name: MissingKeyRejected::NAME,
            category: CheckCategory::Runtime,
            controls: KEY_REJECTION_CONTROLS,
        },
        CheckInfo {
            id: ValidKeyAccepted::ID,
            name: ValidKeyAccepted::NAME,
            category: CheckCategory::Runtime,
            controls: ValidKeyAccepted::CONTROLS,
        },
        CheckInfo {
            id: IdentityInjected::ID,
            name: IdentityInjected::NAME,
            category: CheckCategory::Runtime,
            controls: IdentityInjected::CONTROLS,
        },
    ]
}

fn per_request_results(statuses: &[u16]) -> Value {
    Value::Array(
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| json!({"request": i + 1, "status": status}))
            .collect(),
    )
}

fn count_status(statuses: &[u16], wanted: u16) -> usize {
    statuses.iter().filter(|s| **s == wanted).count()
}

/// RT-001: free tier requests are throttled at the advertised limit
pub struct FreeTierRateLimit {
    dataplane: Arc<dyn DataPlane>,
    api_key: String,
}

impl FreeTierRateLimit {
    pub const ID: &'static str = "RT-001";
    pub const NAME: &'static str = "Rate limiting enforces free tier (5 req/min)";
    pub const REQUESTS: usize = 8;
    pub const EXPECTED_LIMIT: usize = 5;

    pub fn new(dataplane: Arc<dyn DataPlane>, api_key: impl Into<String>) -> Self {
        FreeTierRateLimit {
            dataplane,
            api_key: api_key.into(),
        }
    }
}

impl ComplianceCheck for FreeTierRateLimit {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(RATE_LIMIT_CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let statuses = self
            .dataplane
            .test_rate_limit(&self.api_key, PROBE_PATH, Self::REQUESTS);

        let success_count = count_status(&statuses, 200);
        let rate_limited_count = count_status(&statuses, 429);
        let passed = rate_limited_count > 0 && success_count <= Self::EXPECTED_LIMIT;

        let details = json!({
            "api_key": self.api_key,
            "tier": "free_trial",
            "expected_limit": Self::EXPECTED_LIMIT,
            "requests_sent": Self::REQUESTS,
            "success_count": success_count,
            "rate_limited_count": rate_limited_count,
            "results": per_request_results(&statuses),
            "rate_limit_triggered": rate_limited_count > 0,
        });

        let artifacts = vec![Artifact::new(
            "test_results",
            "HTTP status codes for rate limit test",
            json!(statuses),
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}

/// RT-002: pro tier traffic at modest volume is never throttled
pub struct ProTierRateLimit {
    dataplane: Arc<dyn DataPlane>,
    api_key: String,
}

impl ProTierRateLimit {
    pub const ID: &'static str = "RT-002";
    pub const NAME: &'static str = "Rate limiting enforces pro tier (60 req/min)";
    pub const REQUESTS: usize = 10;
    pub const ADVERTISED_LIMIT: usize = 60;

    pub fn new(dataplane: Arc<dyn DataPlane>, api_key: impl Into<String>) -> Self {
        ProTierRateLimit {
            dataplane,
            api_key: api_key.into(),
        }
    }
}

impl ComplianceCheck for ProTierRateLimit {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(RATE_LIMIT_CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let statuses = self
            .dataplane
            .test_rate_limit(&self.api_key, PROBE_PATH, Self::REQUESTS);

        let success_count = count_status(&statuses, 200);
        let rate_limited_count = count_status(&statuses, 429);
        let passed = success_count == Self::REQUESTS;

        let details = json!({
            "api_key": self.api_key,
            "tier": "pro",
            "expected_limit": Self::ADVERTISED_LIMIT,
            "requests_sent": Self::REQUESTS,
            "success_count": success_count,
            "rate_limited_count": rate_limited_count,
            "results": per_request_results(&statuses),
            "all_passed": passed,
        });

        let artifacts = vec![Artifact::new(
            "test_results",
            "HTTP status codes for pro tier test",
            json!(statuses),
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}

/// Shared logic for the two "request must be rejected with 401" checks.
fn expect_unauthorized(
    dataplane: &dyn DataPlane,
    api_key: Option<&str>,
    description: &str,
) -> Result<CheckOutcome, CheckError> {
    let response = dataplane.get(PROBE_PATH, api_key, &[])?;
    let passed = response.status == 401;

    let details = json!({
        "api_key_used": api_key,
        "expected_status": 401,
        "actual_status": response.status,
        "rejected": passed,
    });

    let artifacts = vec![Artifact::new(
        "http_response",
        description,
        json!({
            "status_code": response.status,
            "headers": response.headers_value(),
        }),
    )];

    Ok(CheckOutcome::verdict(passed, details, artifacts))
}

/// RT-003: unregistered API keys are rejected
pub struct InvalidKeyRejected {
    dataplane: Arc<dyn DataPlane>,
}

impl InvalidKeyRejected {
    pub const ID: &'static str = "RT-003";
    pub const NAME: &'static str = "Invalid API key rejected (401)";

    pub fn new(dataplane: Arc<dyn DataPlane>) -> Self {
        InvalidKeyRejected { dataplane }
    }
}

impl ComplianceCheck for InvalidKeyRejected {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(KEY_REJECTION_CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        expect_unauthorized(
            self.dataplane.as_ref(),
            Some(UNREGISTERED_KEY),
            "Response from invalid key request",
        )
    }
}

/// RT-004: requests without an API key are rejected
pub struct MissingKeyRejected {
    dataplane: Arc<dyn DataPlane>,
}

impl MissingKeyRejected {
    pub const ID: &'static str = "RT-004";
    pub const NAME: &'static str = "Missing API key rejected (401)";

    pub fn new(dataplane: Arc<dyn DataPlane>) -> Self {
        MissingKeyRejected { dataplane }
    }
}

impl ComplianceCheck for MissingKeyRejected {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(KEY_REJECTION_CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        expect_unauthorized(
            self.dataplane.as_ref(),
            None,
            "Response from request without API key",
        )
    }
}

/// RT-005: a registered key reaches the health endpoint
pub struct ValidKeyAccepted {
    dataplane: Arc<dyn DataPlane>,
    api_key: String,
}

impl ValidKeyAccepted {
    pub const ID: &'static str = "RT-005";
    pub const NAME: &'static str = "Valid API key accepted (200)";
    pub const CONTROLS: &'static [&'static str] = &["CC6.1"];

    pub fn new(dataplane: Arc<dyn DataPlane>, api_key: impl Into<String>) -> Self {
        ValidKeyAccepted {
            dataplane,
            api_key: api_key.into(),
        }
    }
}

impl ComplianceCheck for ValidKeyAccepted {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(Self::CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let (_healthy, status, body) = self.dataplane.health_check(&self.api_key);
        let passed = status == 200;

        let details = json!({
            "api_key_used": self.api_key,
            "expected_status": 200,
            "actual_status": status,
            "accepted": passed,
            "health_response": body,
        });

        let artifacts = vec![Artifact::new(
            "http_response",
            "Health check response with valid key",
            body,
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}

/// RT-006: the gateway injects the authenticated consumer's identity upstream
pub struct IdentityInjected {
    dataplane: Arc<dyn DataPlane>,
    api_key: String,
    expected_custom_id: String,
}

impl IdentityInjected {
    pub const ID: &'static str = "RT-006";
    pub const NAME: &'static str = "Consumer identity injected correctly";
    pub const CONTROLS: &'static [&'static str] = &["CC6.1", "CC6.3"];

    pub fn new(
        dataplane: Arc<dyn DataPlane>,
        api_key: impl Into<String>,
        expected_custom_id: impl Into<String>,
    ) -> Self {
        IdentityInjected {
            dataplane,
            api_key: api_key.into(),
            expected_custom_id: expected_custom_id.into(),
        }
    }
}

impl ComplianceCheck for IdentityInjected {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Runtime
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(Self::CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let (status, body) = self.dataplane.get_whoami(&self.api_key);

        let consumer_info = body.get("consumer").cloned().unwrap_or_else(|| json!({}));
        let actual_custom_id = consumer_info
            .get("custom_id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let passed = status == 200 && actual_custom_id == self.expected_custom_id;

        let details = json!({
            "api_key_used": self.api_key,
            "expected_custom_id": self.expected_custom_id,
            "actual_custom_id": actual_custom_id,
            "consumer_info": consumer_info,
            "identity_correct": passed,
        });

        let artifacts = vec![Artifact::new(
            "http_response",
            "Whoami response showing consumer identity",
            body,
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}
