//! Configuration loaded from the environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default KeyCRM API base URL.
const DEFAULT_BASE_URL: &str = "https://openapi.keycrm.app/v1";

/// Default HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cap on accumulated calls during pagination.
const DEFAULT_MAX_CALLS: usize = 400;

/// Runtime settings for the CRM client and pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    /// KeyCRM bearer token.
    pub api_key: SecretString,
    /// Base URL for all CRM API requests.
    pub base_url: String,
    /// New-leads webhook URL.
    pub webhook_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// Maximum calls accumulated across pagination pages in one run.
    pub max_calls: usize,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// `KEYCRM_API_KEY` and `LEAD_WEBHOOK_URL` are required; everything else
    /// falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("KEYCRM_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("KEYCRM_API_KEY".into()))?;

        let webhook_url = std::env::var("LEAD_WEBHOOK_URL")
            .map_err(|_| ConfigError::MissingEnvVar("LEAD_WEBHOOK_URL".into()))?;

        let base_url =
            std::env::var("KEYCRM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs: u64 = std::env::var("LEAD_PULSE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let max_calls: usize = std::env::var("LEAD_PULSE_MAX_CALLS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CALLS);

        if max_calls == 0 {
            return Err(ConfigError::InvalidValue {
                key: "LEAD_PULSE_MAX_CALLS".into(),
                message: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            webhook_url,
            timeout: Duration::from_secs(timeout_secs),
            max_calls,
        })
    }
}
