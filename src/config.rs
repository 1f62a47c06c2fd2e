//! Environment-driven configuration.
//!
//! All settings come from environment variables. Required variables are
//! checked once at startup; a missing one aborts the run before any check
//! executes. The Drata API key is only required when submitting live.

use std::time::Duration;

use thiserror::Error;

use crate::gateway::admin::konnect_api_base;
use crate::gateway::DEFAULT_TIMEOUT_SECS;
use crate::sink::live::DEFAULT_API_BASE;

pub const DEFAULT_REGION: &str = "us";
pub const DEFAULT_CONTROL_PLANE: &str = "kong-hybrid-rate-limit-demo";
pub const DEFAULT_FREE_TRIAL_KEY: &str = "free-trial-key";
pub const DEFAULT_PRO_KEY: &str = "pro-key";
pub const DEFAULT_EXPECTED_CUSTOM_ID: &str = "tier_pro";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Kong Konnect and data-plane settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KongConfig {
    pub konnect_token: String,
    pub konnect_region: String,
    pub control_plane_name: String,
    pub dataplane_url: String,
    pub free_trial_key: String,
    pub pro_key: String,
    pub expected_custom_id: String,
}

impl KongConfig {
    /// Konnect API base URL for the configured region.
    pub fn konnect_api_base(&self) -> &'static str {
        konnect_api_base(&self.konnect_region)
    }
}

/// Drata API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrataConfig {
    pub api_key: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub kong: KongConfig,
    pub drata: DrataConfig,
    pub dry_run: bool,
    pub verbose: bool,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::MissingVar(name));
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());
        let flag = |name: &str| get(name).map_or(false, |v| v.eq_ignore_ascii_case("true"));

        let kong = KongConfig {
            konnect_token: required("KONNECT_TOKEN")?,
            konnect_region: or_default("KONNECT_REGION", DEFAULT_REGION),
            control_plane_name: or_default("CONTROL_PLANE_NAME", DEFAULT_CONTROL_PLANE),
            dataplane_url: required("DATAPLANE_URL")?,
            free_trial_key: or_default("FREE_TRIAL_KEY", DEFAULT_FREE_TRIAL_KEY),
            pro_key: or_default("PRO_KEY", DEFAULT_PRO_KEY),
            expected_custom_id: or_default("EXPECTED_CUSTOM_ID", DEFAULT_EXPECTED_CUSTOM_ID),
        };

        let drata = DrataConfig {
            api_key: get("DRATA_API_KEY"),
            api_base: or_default("DRATA_API_BASE", DEFAULT_API_BASE),
        };

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "REQUEST_TIMEOUT_SECS",
                        reason: format!("expected a positive number of seconds, got '{}'", raw),
                    })
                }
            },
        };

        let config = Config {
            kong,
            drata,
            dry_run: flag("DRY_RUN"),
            verbose: flag("VERBOSE"),
            request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line switches; they can only turn modes on.
    pub fn with_overrides(mut self, dry_run: bool, verbose: bool) -> Self {
        self.dry_run |= dry_run;
        self.verbose |= verbose;
        self
    }

    /// The Drata API key, required for live submission.
    pub fn drata_api_key(&self) -> Result<&str, ConfigError> {
        self.drata
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingVar("DRATA_API_KEY"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("DATAPLANE_URL", &self.kong.dataplane_url),
            ("DRATA_API_BASE", &self.drata.api_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }
        Ok(())
    }
}
