//! Custom error types for ecr-sync
//!
//! Every failure a reconciliation cycle can hit maps onto one variant here.
//! Cycle-level errors are logged and swallowed by the scheduler.

use thiserror::Error;

/// Main error type for the ecr-sync application
#[derive(Error, Debug)]
pub enum SyncError {
    /// Startup configuration is missing or invalid
    #[error("Configuration error: {0}\n\n  → Run 'ecr-sync --help' to see each setting and its environment variable.")]
    Config(String),

    /// Authorization token request failed
    #[error("ECR authorization request failed: {0}\n\n  → Check the AWS credentials and region available to this process.")]
    Fetch(String),

    /// Authorization request succeeded but returned nothing
    #[error("Request did not return authorization data")]
    NoAuthorizationData,

    /// Authorization token is not valid base64 / UTF-8
    #[error("Error decoding authorization token: {0}")]
    Decode(String),

    /// Decoded token does not look like `<user>:<password>`
    #[error("Authorization token does not contain data in <user>:<password> format")]
    TokenFormat,

    /// A URL could not be parsed or has no usable host
    #[error("Cannot parse URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Platform API returned an error response
    #[error("Platform API request failed: {0}")]
    Platform(String),

    /// Network request error
    #[error("Network request failed: {0}\n\n  → Check that the platform URL is reachable.")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Build an `InvalidUrl` error
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        SyncError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;
