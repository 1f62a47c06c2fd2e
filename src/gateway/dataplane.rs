//! Kong data-plane client for runtime probes.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use tracing::debug;

use super::{DataPlane, GatewayError, GatewayResponse};

/// Header carrying the consumer API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Client that sends requests through the gateway's traffic path.
pub struct DataplaneClient {
    client: Client,
    base_url: String,
}

impl DataplaneClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Client)?;

        Ok(DataplaneClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a request to the data-plane. Any HTTP status is returned as a response.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        api_key: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<GatewayResponse, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, url = %url, with_key = api_key.is_some(), "data-plane request");

        let mut builder = self.client.request(method, &url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().map_err(|source| GatewayError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .text()
            .map_err(|source| GatewayError::Transport { url, source })?;

        Ok(GatewayResponse {
            status,
            headers,
            body,
        })
    }
}

impl DataPlane for DataplaneClient {
    fn get(
        &self,
        path: &str,
        api_key: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<GatewayResponse, GatewayError> {
        self.request(Method::GET, path, api_key, headers)
    }
}
