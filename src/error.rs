//! Error types for lead-pulse.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the CRM API and webhook collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// Transport failure or non-success HTTP status.
    #[error("Request to {endpoint} failed: {reason}")]
    Network { endpoint: String, reason: String },

    /// Payload did not match the expected shape.
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrmError {
    /// Wrap a reqwest error for a given endpoint.
    pub fn network(endpoint: impl Into<String>, err: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            reason: err.to_string(),
        }
    }
}

/// Errors from one orchestration run.
///
/// A run either fully succeeds and yields a snapshot, or fails with one of
/// these and leaves any previous snapshot untouched.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Fetch failed during {phase}: {source}")]
    Fetch {
        phase: &'static str,
        #[source]
        source: CrmError,
    },

    #[error("Run exceeded deadline of {seconds}s")]
    DeadlineExceeded { seconds: u64 },
}
