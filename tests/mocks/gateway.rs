//! Mock gateway implementations for testing.
//!
//! Provides configurable doubles that simulate:
//! - A Kong data-plane (rate limiting, key authentication, identity injection)
//! - The Konnect admin API (consumers and plugins)
//! - Outages on either side

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map};

use gateway_evidence::engine::orchestrator::CheckContext;
use gateway_evidence::gateway::{AdminApi, Consumer, DataPlane, GatewayError, GatewayResponse, Plugin};

pub const FREE_KEY: &str = "free-trial-key";
pub const PRO_KEY: &str = "pro-key";
pub const PRO_CUSTOM_ID: &str = "tier_pro";

/// Mock data-plane configuration
#[derive(Debug, Clone)]
pub struct MockDataPlaneConfig {
    /// Requests per key allowed before 429, keyed by API key
    pub limits: HashMap<String, usize>,
    /// custom_id injected for each key
    pub identities: HashMap<String, String>,
    /// Whether requests without a registered key are rejected
    pub enforce_auth: bool,
    /// Status returned by /api/health
    pub health_status: u16,
    /// Every request fails at the transport level
    pub unreachable: bool,
}

impl MockDataPlaneConfig {
    /// A correctly configured gateway: free tier 5/min, pro tier 60/min
    pub fn compliant() -> Self {
        MockDataPlaneConfig {
            limits: HashMap::from([(FREE_KEY.to_string(), 5), (PRO_KEY.to_string(), 60)]),
            identities: HashMap::from([
                (FREE_KEY.to_string(), "tier_free".to_string()),
                (PRO_KEY.to_string(), PRO_CUSTOM_ID.to_string()),
            ]),
            enforce_auth: true,
            health_status: 200,
            unreachable: false,
        }
    }

    /// Key auth is on but rate limiting is missing
    pub fn no_rate_limit() -> Self {
        let mut config = Self::compliant();
        config.limits = HashMap::from([
            (FREE_KEY.to_string(), usize::MAX),
            (PRO_KEY.to_string(), usize::MAX),
        ]);
        config
    }

    /// Anyone can call the API
    pub fn open_gateway() -> Self {
        let mut config = Self::compliant();
        config.enforce_auth = false;
        config
    }

    /// Pro consumer is injected with the wrong identity
    pub fn wrong_identity() -> Self {
        let mut config = Self::compliant();
        config.identities.insert(PRO_KEY.to_string(), "tier_free".to_string());
        config
    }

    pub fn unreachable() -> Self {
        let mut config = Self::compliant();
        config.unreachable = true;
        config
    }
}

/// Simulated Kong data-plane
pub struct MockDataPlane {
    config: MockDataPlaneConfig,
    counters: RefCell<HashMap<String, usize>>,
    requests: RefCell<Vec<(String, Option<String>)>>,
}

impl MockDataPlane {
    pub fn new(config: MockDataPlaneConfig) -> Self {
        MockDataPlane {
            config,
            counters: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Every (path, key) received, in order
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.borrow().clone()
    }

    fn throttled(&self, key: &str) -> bool {
        let limit = self.config.limits.get(key).copied().unwrap_or(usize::MAX);
        let mut counters = self.counters.borrow_mut();
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count > limit
    }
}

impl DataPlane for MockDataPlane {
    fn get(
        &self,
        path: &str,
        api_key: Option<&str>,
        _headers: &[(&str, &str)],
    ) -> Result<GatewayResponse, GatewayError> {
        self.requests
            .borrow_mut()
            .push((path.to_string(), api_key.map(str::to_string)));

        if self.config.unreachable {
            return Err(GatewayError::Decode {
                url: format!("http://mock-dataplane{}", path),
                message: "connection refused".to_string(),
            });
        }

        let registered = api_key.filter(|k| self.config.identities.contains_key(*k));
        let key = match registered {
            Some(key) => key,
            None if self.config.enforce_auth => {
                let mut response =
                    GatewayResponse::new(401, r#"{"message": "No API key found in request"}"#);
                response
                    .headers
                    .push(("WWW-Authenticate".to_string(), "Key realm=\"kong\"".to_string()));
                return Ok(response);
            }
            None => "anonymous",
        };

        if self.throttled(key) {
            let mut response = GatewayResponse::new(429, r#"{"message": "API rate limit exceeded"}"#);
            response
                .headers
                .push(("RateLimit-Remaining".to_string(), "0".to_string()));
            return Ok(response);
        }

        let body = match path {
            "/api/health" => {
                return Ok(GatewayResponse::new(
                    self.config.health_status,
                    json!({"status": "ok"}).to_string(),
                ))
            }
            "/api/whoami" => json!({
                "consumer": {
                    "custom_id": self.config.identities.get(key),
                    "username": key,
                }
            }),
            _ => json!({"message": "hello"}),
        };

        Ok(GatewayResponse::new(200, body.to_string()))
    }
}

/// Simulated Konnect admin API
#[derive(Debug, Clone, Default)]
pub struct MockAdmin {
    pub consumers: Vec<Consumer>,
    pub plugins: Vec<Plugin>,
    pub unavailable: bool,
}

pub fn consumer(id: &str, username: &str, custom_id: &str) -> Consumer {
    Consumer {
        id: id.to_string(),
        username: username.to_string(),
        custom_id: Some(custom_id.to_string()),
        created_at: 1_700_000_000,
    }
}

pub fn key_auth_plugin(id: &str, enabled: bool) -> Plugin {
    Plugin {
        id: id.to_string(),
        name: "key-auth".to_string(),
        enabled,
        config: Map::new(),
        consumer_id: None,
        service_id: Some("svc-demo".to_string()),
        route_id: None,
    }
}

pub fn rate_limit_plugin(id: &str, consumer_id: Option<&str>, minute: u64) -> Plugin {
    let mut config = Map::new();
    config.insert("minute".to_string(), json!(minute));
    config.insert("policy".to_string(), json!("local"));
    Plugin {
        id: id.to_string(),
        name: "rate-limiting".to_string(),
        enabled: true,
        config,
        consumer_id: consumer_id.map(str::to_string),
        service_id: None,
        route_id: None,
    }
}

impl MockAdmin {
    /// Two consumers, each with its own rate limit, behind key-auth
    pub fn compliant() -> Self {
        MockAdmin {
            consumers: vec![
                consumer("c-free", "free-trial-user", "tier_free"),
                consumer("c-pro", "pro-user", PRO_CUSTOM_ID),
            ],
            plugins: vec![
                key_auth_plugin("ka-1", true),
                rate_limit_plugin("rl-free", Some("c-free"), 5),
                rate_limit_plugin("rl-pro", Some("c-pro"), 60),
            ],
            unavailable: false,
        }
    }

    /// A consumer was added without a rate limit
    pub fn uncovered_consumer() -> Self {
        let mut admin = Self::compliant();
        admin.consumers.push(consumer("c-new", "new-partner", "tier_partner"));
        admin
    }

    /// Control plane with nothing configured
    pub fn empty() -> Self {
        MockAdmin::default()
    }

    pub fn unavailable() -> Self {
        MockAdmin {
            unavailable: true,
            ..Default::default()
        }
    }

    fn outage(&self) -> GatewayError {
        GatewayError::Status {
            url: "https://us.api.konghq.com/v2/control-planes".to_string(),
            status: 503,
        }
    }
}

impl AdminApi for MockAdmin {
    fn get_consumers(&self) -> Result<Vec<Consumer>, GatewayError> {
        if self.unavailable {
            return Err(self.outage());
        }
        Ok(self.consumers.clone())
    }

    fn get_plugins(&self, name_filter: Option<&str>) -> Result<Vec<Plugin>, GatewayError> {
        if self.unavailable {
            return Err(self.outage());
        }
        Ok(self
            .plugins
            .iter()
            .filter(|p| name_filter.map_or(true, |name| p.name == name))
            .cloned()
            .collect())
    }
}

/// Build a check context over the given mocks
pub fn mock_context(admin: MockAdmin, dataplane: MockDataPlaneConfig) -> CheckContext {
    CheckContext {
        admin: Arc::new(admin),
        dataplane: Arc::new(MockDataPlane::new(dataplane)),
        free_key: FREE_KEY.to_string(),
        pro_key: PRO_KEY.to_string(),
        expected_custom_id: PRO_CUSTOM_ID.to_string(),
    }
}
