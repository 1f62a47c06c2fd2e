//! Drata public API client.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use super::{EvidenceSink, SinkError, SinkMode, SubmissionPayload};

/// Default Drata public API base URL.
pub const DEFAULT_API_BASE: &str = "https://public-api.drata.com";

/// Submits evidence to Drata monitors.
pub struct DrataClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl DrataClient {
    pub fn new(api_key: &str, api_base: &str, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SinkError::Client)?;

        Ok(DrataClient {
            client,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn checked(url: String, response: Response) -> Result<Value, SinkError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|source| SinkError::Transport { url: url.clone(), source })?;

        if !status.is_success() {
            return Err(SinkError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Controls defined in the Drata workspace.
    pub fn get_controls(&self) -> Result<Vec<Value>, SinkError> {
        self.get_list("/public/controls")
    }

    /// Monitors defined in the Drata workspace.
    pub fn get_monitors(&self) -> Result<Vec<Value>, SinkError> {
        self.get_list("/public/monitors")
    }

    fn get_list(&self, path: &str) -> Result<Vec<Value>, SinkError> {
        let url = self.url(path);
        debug!(url = %url, "drata request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|source| SinkError::Transport { url: url.clone(), source })?;

        let body = Self::checked(url, response)?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl EvidenceSink for DrataClient {
    fn submit(&self, monitor_id: &str, payload: &SubmissionPayload) -> Result<Value, SinkError> {
        let url = self.url(&format!("/public/monitors/{}/evidence", monitor_id));
        debug!(url = %url, monitor = monitor_id, "submitting evidence");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .map_err(|source| SinkError::Transport { url: url.clone(), source })?;

        Self::checked(url, response)
    }

    /// Reachable when the monitors endpoint answers 200, 401 or 403.
    fn health_check(&self) -> bool {
        let url = self.url("/public/monitors");
        match self.client.get(&url).bearer_auth(&self.api_key).send() {
            Ok(response) => matches!(
                response.status(),
                StatusCode::OK | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ),
            Err(e) => {
                warn!(url = %url, error = %e, "drata health probe failed");
                false
            }
        }
    }

    fn mode(&self) -> SinkMode {
        SinkMode::Live
    }
}
