//! Error types for hcloud-dyndns.

use thiserror::Error;

/// Result type alias for hcloud-dyndns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
///
/// Every variant is fatal for the current run. Nothing is retried
/// internally; re-running the updater is the retry mechanism.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP transport error.
    #[error("Network error: {0}")]
    Network(String),

    /// Unexpected HTTP status from the DNS provider.
    #[error("Provider error: {operation} returned HTTP {status}: {body}")]
    Provider {
        operation: String,
        status: u16,
        body: String,
    },

    /// Resolved address is unusable for the record type.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DdnsError {
    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            DdnsError::Config(_) => 2,
            DdnsError::Validation(_) => 3,
            DdnsError::Network(_) => 4,
            DdnsError::Provider { .. } | DdnsError::Serialization(_) => 5,
        }
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DdnsError {
    fn from(e: toml::ser::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}
