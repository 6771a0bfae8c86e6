//! Runtime configuration
//!
//! Built once at startup from the parsed CLI/environment, validated, and then
//! handed by reference to every component. Never mutated afterwards.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::cli::Cli;
use crate::error::{Result, SyncError};

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Rancher API endpoint
    pub platform_url: Url,
    /// Rancher API access key
    pub access_key: String,
    /// Rancher API secret key
    pub secret_key: SecretString,
    /// ECR registry ids passed to the authorization request (empty = default)
    pub registry_ids: Vec<String>,
    /// Time between reconciliation cycles
    pub interval: Duration,
    /// Per-request timeout for AWS and Rancher calls
    pub request_timeout: Duration,
    /// Optional AWS region override
    pub region: Option<String>,
    /// Run a single cycle and exit
    pub once: bool,
}

impl Config {
    /// Validate CLI input and build the configuration
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let url = cli.url.trim();
        if url.is_empty() {
            return Err(SyncError::Config("platform URL is not set".into()));
        }
        let platform_url = Url::parse(url)
            .map_err(|e| SyncError::Config(format!("platform URL '{}' is invalid: {}", url, e)))?;
        if !matches!(platform_url.scheme(), "http" | "https") {
            return Err(SyncError::Config(format!(
                "platform URL '{}' must use http or https",
                url
            )));
        }

        if cli.access_key.is_empty() {
            return Err(SyncError::Config("platform access key is not set".into()));
        }
        if cli.secret_key.is_empty() {
            return Err(SyncError::Config("platform secret key is not set".into()));
        }

        let registry_ids = cli
            .registry_ids
            .iter()
            .map(|id| id.trim().to_string())
            .collect::<Vec<_>>();
        if registry_ids.iter().any(String::is_empty) {
            return Err(SyncError::Config(
                "registry id list contains an empty entry".into(),
            ));
        }

        if cli.interval_secs == 0 {
            return Err(SyncError::Config("interval must be greater than zero".into()));
        }
        if cli.timeout_secs == 0 {
            return Err(SyncError::Config("timeout must be greater than zero".into()));
        }

        Ok(Self {
            platform_url,
            access_key: cli.access_key,
            secret_key: SecretString::from(cli.secret_key),
            registry_ids,
            interval: Duration::from_secs(cli.interval_secs),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            region: cli.region.filter(|r| !r.trim().is_empty()),
            once: cli.once,
        })
    }
}
