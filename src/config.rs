/*!
 * Guard Configuration
 *
 * Runtime configuration for the sandbox: audit retention, default
 * container overrides and trace output.
 */

use crate::core::limits::MAX_AUDIT_EVENTS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sandbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Events kept in the audit ring buffer (0 disables auditing)
    pub audit_capacity: usize,
    /// Record approvals as well as denials
    pub audit_allowed: bool,
    /// Install the curated dict/list/tuple/str overrides
    pub container_defaults: bool,
    /// JSON trace output instead of human-readable lines
    pub trace_json: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            audit_capacity: MAX_AUDIT_EVENTS,
            audit_allowed: false,
            container_defaults: true,
            trace_json: false,
        }
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

impl GuardConfig {
    /// Configuration that audits every decision, allowed or not
    pub fn audit_everything() -> Self {
        Self {
            audit_allowed: true,
            ..Self::default()
        }
    }

    /// Configuration without an audit trail (testing only)
    pub fn unaudited() -> Self {
        Self {
            audit_capacity: 0,
            ..Self::default()
        }
    }

    pub fn audit_enabled(&self) -> bool {
        self.audit_capacity > 0
    }

    /// Defaults overridden by environment variables
    ///
    /// Environment variables:
    /// - GUARD_AUDIT_CAPACITY: audit ring buffer size
    /// - GUARD_AUDIT_ALLOWED: record approvals too (default: false)
    /// - GUARD_CONTAINER_DEFAULTS: install container overrides (default: true)
    /// - GUARD_TRACE_JSON: JSON trace output (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("GUARD_AUDIT_CAPACITY") {
            config.audit_capacity = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "GUARD_AUDIT_CAPACITY",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("GUARD_AUDIT_ALLOWED") {
            config.audit_allowed = parse_flag("GUARD_AUDIT_ALLOWED", &value)?;
        }
        if let Some(value) = lookup("GUARD_CONTAINER_DEFAULTS") {
            config.container_defaults = parse_flag("GUARD_CONTAINER_DEFAULTS", &value)?;
        }
        if let Some(value) = lookup("GUARD_TRACE_JSON") {
            config.trace_json = parse_flag("GUARD_TRACE_JSON", &value)?;
        }

        Ok(config)
    }

    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
