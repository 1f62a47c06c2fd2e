//! Configuration checks (CF-001 through CF-003).
//!
//! Audit the gateway's declared configuration through the admin API. Admin
//! failures propagate and are recorded as ERROR.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use super::{controls, CheckError, CheckInfo, CheckOutcome, ComplianceCheck};
use crate::engine::result::Artifact;
use crate::gateway::{AdminApi, Plugin};
use crate::CheckCategory;

const KEY_AUTH_PLUGIN: &str = "key-auth";
const RATE_LIMIT_PLUGIN: &str = "rate-limiting";
const SNAPSHOT: &str = "config_snapshot";

/// Get all configuration checks metadata
pub fn catalog() -> Vec<CheckInfo> {
    vec![
        CheckInfo {
            id: AuthPluginEnabled::ID,
            name: AuthPluginEnabled::NAME,
            category: CheckCategory::Configuration,
            controls: AuthPluginEnabled::CONTROLS,
        },
        CheckInfo {
            id: RateLimitPluginEnabled::ID,
            name: RateLimitPluginEnabled::NAME,
            category: CheckCategory::Configuration,
            controls: RateLimitPluginEnabled::CONTROLS,
        },
        CheckInfo {
            id: ConsumerLimitCoverage::ID,
            name: ConsumerLimitCoverage::NAME,
            category: CheckCategory::Configuration,
            controls: ConsumerLimitCoverage::CONTROLS,
        },
    ]
}

/// CF-001: at least one enabled key-auth plugin exists
pub struct AuthPluginEnabled {
    admin: Arc<dyn AdminApi>,
}

impl AuthPluginEnabled {
    pub const ID: &'static str = "CF-001";
    pub const NAME: &'static str = "Key authentication plugin enabled";
    pub const CONTROLS: &'static [&'static str] = &["CC6.1", "CC8.1"];

    pub fn new(admin: Arc<dyn AdminApi>) -> Self {
        AuthPluginEnabled { admin }
    }
}

impl ComplianceCheck for AuthPluginEnabled {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Configuration
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(Self::CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let plugins = self.admin.get_plugins(Some(KEY_AUTH_PLUGIN))?;
        let enabled_count = plugins.iter().filter(|p| p.enabled).count();
        let passed = enabled_count > 0;

        let plugin_configs: Vec<Value> = plugins
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "enabled": p.enabled,
                    "service_id": p.service_id,
                    "route_id": p.route_id,
                })
            })
            .collect();

        let details = json!({
            "plugin_name": KEY_AUTH_PLUGIN,
            "total_found": plugins.len(),
            "enabled_count": enabled_count,
            "plugin_configs": plugin_configs,
            "auth_enforced": passed,
        });

        let artifacts = vec![Artifact::new(
            SNAPSHOT,
            "Key-auth plugin configuration",
            Value::Array(plugin_configs),
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}

/// CF-002: at least one enabled rate-limiting plugin is scoped to a consumer
pub struct RateLimitPluginEnabled {
    admin: Arc<dyn AdminApi>,
}

impl RateLimitPluginEnabled {
    pub const ID: &'static str = "CF-002";
    pub const NAME: &'static str = "Rate limiting plugin enabled per consumer";
    pub const CONTROLS: &'static [&'static str] = &["CC6.1", "CC6.3", "CC8.1"];

    pub fn new(admin: Arc<dyn AdminApi>) -> Self {
        RateLimitPluginEnabled { admin }
    }
}

fn rate_limit_snapshot(plugin: &Plugin) -> Value {
    json!({
        "id": plugin.id,
        "enabled": plugin.enabled,
        "consumer_id": plugin.consumer_id,
        "config": {
            "minute": plugin.config_value("minute"),
            "hour": plugin.config_value("hour"),
            "policy": plugin.config_value("policy"),
        },
    })
}

impl ComplianceCheck for RateLimitPluginEnabled {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Configuration
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(Self::CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let plugins = self.admin.get_plugins(Some(RATE_LIMIT_PLUGIN))?;
        let consumer_scoped_count = plugins.iter().filter(|p| p.is_consumer_scoped()).count();
        let passed = consumer_scoped_count > 0;

        let plugin_configs: Vec<Value> = plugins.iter().map(rate_limit_snapshot).collect();

        let details = json!({
            "plugin_name": RATE_LIMIT_PLUGIN,
            "total_found": plugins.len(),
            "consumer_scoped_count": consumer_scoped_count,
            "plugin_configs": plugin_configs,
            "rate_limiting_configured": passed,
        });

        let artifacts = vec![Artifact::new(
            SNAPSHOT,
            "Rate limiting plugin configuration",
            Value::Array(plugin_configs),
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}

/// CF-003: every consumer is covered by an enabled consumer-scoped rate limit
pub struct ConsumerLimitCoverage {
    admin: Arc<dyn AdminApi>,
}

impl ConsumerLimitCoverage {
    pub const ID: &'static str = "CF-003";
    pub const NAME: &'static str = "All consumers have rate limits configured";
    pub const CONTROLS: &'static [&'static str] = &["CC6.2", "CC6.3"];

    pub fn new(admin: Arc<dyn AdminApi>) -> Self {
        ConsumerLimitCoverage { admin }
    }
}

/// Percentage rounded to one decimal place; zero when there is nothing to cover.
fn coverage_percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = covered as f64 / total as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

impl ComplianceCheck for ConsumerLimitCoverage {
    fn check_id(&self) -> &str {
        Self::ID
    }

    fn check_name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Configuration
    }

    fn control_mapping(&self) -> Vec<String> {
        controls(Self::CONTROLS)
    }

    fn execute(&self) -> Result<CheckOutcome, CheckError> {
        let consumers = self.admin.get_consumers()?;
        let plugins = self.admin.get_plugins(Some(RATE_LIMIT_PLUGIN))?;

        let limited: HashSet<&str> = plugins
            .iter()
            .filter(|p| p.is_consumer_scoped())
            .filter_map(|p| p.consumer_id.as_deref())
            .collect();

        let mut consumer_coverage = Vec::with_capacity(consumers.len());
        let mut missing_limits = Vec::new();
        for consumer in &consumers {
            let has_rate_limit = limited.contains(consumer.id.as_str());
            consumer_coverage.push(json!({
                "id": consumer.id,
                "username": consumer.username,
                "custom_id": consumer.custom_id,
                "has_rate_limit": has_rate_limit,
            }));
            if !has_rate_limit {
                missing_limits.push(consumer.username.clone());
            }
        }

        let total = consumers.len();
        let covered = total - missing_limits.len();
        // An empty consumer list fails.
        let passed = total > 0 && missing_limits.is_empty();

        let details = json!({
            "total_consumers": total,
            "consumers_with_limits": covered,
            "coverage_percent": coverage_percent(covered, total),
            "missing_limits": missing_limits,
            "consumer_coverage": consumer_coverage,
            "full_coverage": passed,
        });

        let artifacts = vec![Artifact::new(
            SNAPSHOT,
            "Consumer rate limit coverage",
            Value::Array(consumer_coverage),
        )];

        Ok(CheckOutcome::verdict(passed, details, artifacts))
    }
}
