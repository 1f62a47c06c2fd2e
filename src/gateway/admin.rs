//! Kong Konnect admin API client.
//!
//! Resolves the configured control plane by name (once, then cached) and
//! reads its core entities. Every non-2xx response is an error.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{AdminApi, Consumer, GatewayError, Plugin};

const DEFAULT_REGION_BASE: &str = "https://us.api.konghq.com";

/// Konnect API base URL for a region; unknown regions fall back to `us`.
pub fn konnect_api_base(region: &str) -> &'static str {
    match region {
        "us" => "https://us.api.konghq.com",
        "eu" => "https://eu.api.konghq.com",
        "au" => "https://au.api.konghq.com",
        _ => DEFAULT_REGION_BASE,
    }
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize)]
struct ControlPlane {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct EntityRef {
    id: String,
}

#[derive(Deserialize)]
struct RawPlugin {
    id: String,
    name: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    config: Option<Map<String, Value>>,
    #[serde(default)]
    consumer: Option<EntityRef>,
    #[serde(default)]
    service: Option<EntityRef>,
    #[serde(default)]
    route: Option<EntityRef>,
}

fn enabled_by_default() -> bool {
    true
}

impl From<RawPlugin> for Plugin {
    fn from(raw: RawPlugin) -> Self {
        Plugin {
            id: raw.id,
            name: raw.name,
            enabled: raw.enabled,
            config: raw.config.unwrap_or_default(),
            consumer_id: raw.consumer.map(|c| c.id),
            service_id: raw.service.map(|s| s.id),
            route_id: raw.route.map(|r| r.id),
        }
    }
}

/// Client for the Konnect control-plane admin API.
pub struct KonnectClient {
    client: Client,
    token: String,
    api_base: String,
    control_plane_name: String,
    control_plane_id: OnceLock<String>,
}

impl KonnectClient {
    pub fn new(
        token: &str,
        api_base: &str,
        control_plane_name: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Client)?;

        Ok(KonnectClient {
            client,
            token: token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            control_plane_name: control_plane_name.to_string(),
            control_plane_id: OnceLock::new(),
        })
    }

    pub fn control_plane_name(&self) -> &str {
        &self.control_plane_name
    }

    /// Id of the configured control plane, looked up by name on first use.
    pub fn control_plane_id(&self) -> Result<&str, GatewayError> {
        if let Some(id) = self.control_plane_id.get() {
            return Ok(id);
        }

        let url = format!("{}/v2/control-planes", self.api_base);
        let planes: ListResponse<ControlPlane> = self.get_json(&url)?;
        let id = planes
            .data
            .into_iter()
            .find(|cp| cp.name == self.control_plane_name)
            .map(|cp| cp.id)
            .ok_or_else(|| GatewayError::ControlPlaneNotFound(self.control_plane_name.clone()))?;

        debug!(control_plane = %self.control_plane_name, id = %id, "resolved control plane");
        Ok(self.control_plane_id.get_or_init(|| id))
    }

    fn admin_url(&self, path: &str) -> Result<String, GatewayError> {
        let id = self.control_plane_id()?;
        Ok(format!(
            "{}/v2/control-planes/{}/core-entities{}",
            self.api_base, id, path
        ))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        debug!(url, "konnect request");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|source| GatewayError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl AdminApi for KonnectClient {
    fn get_consumers(&self) -> Result<Vec<Consumer>, GatewayError> {
        let url = self.admin_url("/consumers")?;
        let consumers: ListResponse<Consumer> = self.get_json(&url)?;
        Ok(consumers.data)
    }

    fn get_plugins(&self, name_filter: Option<&str>) -> Result<Vec<Plugin>, GatewayError> {
        let url = self.admin_url("/plugins")?;
        let plugins: ListResponse<RawPlugin> = self.get_json(&url)?;

        Ok(plugins
            .data
            .into_iter()
            .filter(|p| name_filter.map_or(true, |name| p.name == name))
            .map(Plugin::from)
            .collect())
    }
}
