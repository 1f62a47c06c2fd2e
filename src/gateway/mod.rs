//! Gateway collaborators used by the checks.
//!
//! Two capability boundaries are consumed by the check implementations:
//! - [`AdminApi`]: read access to gateway configuration (consumers, plugins)
//! - [`DataPlane`]: live requests through the gateway's traffic path
//!
//! The HTTP implementations talk to Kong Konnect and a Kong data-plane. Tests
//! substitute scripted doubles for both traits.

pub mod admin;
pub mod dataplane;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

pub use admin::KonnectClient;
pub use dataplane::DataplaneClient;

/// Default per-request timeout for gateway calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised by gateway collaborators.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("control plane '{0}' not found")]
    ControlPlaneNotFound(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A gateway consumer as reported by the admin API.
///
/// Kong reports unset fields as explicit `null`; those read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Consumer {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A gateway plugin instance, flattened from the admin API representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub config: Map<String, Value>,
    pub consumer_id: Option<String>,
    pub service_id: Option<String>,
    pub route_id: Option<String>,
}

impl Plugin {
    /// Enabled and scoped to a consumer.
    pub fn is_consumer_scoped(&self) -> bool {
        self.enabled && self.consumer_id.is_some()
    }

    /// A config value, or `null` when absent.
    pub fn config_value(&self, key: &str) -> Value {
        self.config.get(key).cloned().unwrap_or(Value::Null)
    }
}

/// Read-only access to gateway configuration.
pub trait AdminApi {
    /// All consumers, in admin API order.
    fn get_consumers(&self) -> Result<Vec<Consumer>, GatewayError>;

    /// All plugins, optionally restricted to one plugin name.
    fn get_plugins(&self, name_filter: Option<&str>) -> Result<Vec<Plugin>, GatewayError>;
}

/// HTTP response captured from the data-plane.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: String,
}

impl GatewayResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        GatewayResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Check if the response indicates success (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON; anything unparseable becomes an empty object.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Headers as a JSON object, for evidence snapshots.
    pub fn headers_value(&self) -> Value {
        let map: Map<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

/// Live requests through the gateway.
///
/// Implementors provide [`DataPlane::get`]; the probe helpers are shared and
/// tolerate transport failures by reporting status 0.
pub trait DataPlane {
    /// Issue a GET request, sending `api_key` as the gateway API key when present.
    fn get(
        &self,
        path: &str,
        api_key: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<GatewayResponse, GatewayError>;

    /// Probe `/api/health`: (healthy, status, body).
    fn health_check(&self, api_key: &str) -> (bool, u16, Value) {
        match self.get("/api/health", Some(api_key), &[]) {
            Ok(response) => (response.status == 200, response.status, response.json()),
            Err(e) => (false, 0, error_body(&e)),
        }
    }

    /// Fetch `/api/whoami`: (status, body).
    fn get_whoami(&self, api_key: &str) -> (u16, Value) {
        match self.get("/api/whoami", Some(api_key), &[]) {
            Ok(response) => (response.status, response.json()),
            Err(e) => (0, error_body(&e)),
        }
    }

    /// Send `num_requests` sequential requests and collect every status code.
    ///
    /// The burst always runs to completion; a failed request is recorded as 0.
    fn test_rate_limit(&self, api_key: &str, path: &str, num_requests: usize) -> Vec<u16> {
        (0..num_requests)
            .map(|_| match self.get(path, Some(api_key), &[]) {
                Ok(response) => response.status,
                Err(e) => {
                    tracing::debug!(path, error = %e, "rate limit probe request failed");
                    0
                }
            })
            .collect()
    }
}

fn error_body(error: &GatewayError) -> Value {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(error.to_string()));
    Value::Object(map)
}
