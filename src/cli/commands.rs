//! CLI definition using clap
//!
//! Every option can also be supplied through the environment, which is how
//! the daemon is normally configured when run as a platform service.

use clap::Parser;

/// Default refresh interval: 6 hours
pub const DEFAULT_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Default timeout for a single platform request
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ecr-sync - keep a Rancher registry credential fresh with AWS ECR tokens
///
/// Fetches an ECR authorization token, finds the Rancher registry whose
/// address matches the token's proxy endpoint and overwrites its stored
/// credential. Runs once at startup and then on a fixed interval.
#[derive(Parser, Debug, Clone)]
#[command(name = "ecr-sync", version, about, long_about = None)]
pub struct Cli {
    /// Rancher API endpoint
    #[arg(long, env = "CATTLE_URL", default_value = "")]
    pub url: String,

    /// Rancher API access key
    #[arg(long, env = "CATTLE_ACCESS_KEY", default_value = "")]
    pub access_key: String,

    /// Rancher API secret key
    #[arg(long, env = "CATTLE_SECRET_KEY", default_value = "", hide_env_values = true)]
    pub secret_key: String,

    /// ECR registry ids to request tokens for (comma-separated)
    #[arg(
        long,
        env = "AWS_ECR_LOGIN_REGISTRY_IDS",
        value_delimiter = ',',
        num_args = 0..
    )]
    pub registry_ids: Vec<String>,

    /// Seconds between reconciliation cycles
    #[arg(long, env = "ECR_SYNC_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Timeout in seconds for each request to AWS or Rancher
    #[arg(long, env = "ECR_SYNC_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// AWS region override (defaults to the standard provider chain)
    #[arg(long, env = "ECR_SYNC_REGION")]
    pub region: Option<String>,

    /// Run a single reconciliation cycle and exit
    #[arg(long, env = "ECR_SYNC_ONCE")]
    pub once: bool,
}
