//! ECR authorization token fetching

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_ecr::error::DisplayErrorContext;
use aws_sdk_ecr::types::AuthorizationData;
use aws_sdk_ecr::Client;

use crate::core::token::AuthorizationToken;
use crate::core::Config;
use crate::error::{Result, SyncError};

/// Source of registry authorization tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    /// Request authorization data, optionally scoped to registry ids
    async fn fetch(&self, registry_ids: &[String]) -> Result<Vec<AuthorizationToken>>;
}

/// Fetch a token and keep only the first authorization entry
///
/// ## Errors
///
/// - `Fetch` - the authorization request failed
/// - `NoAuthorizationData` - the response held no entries
pub async fn fetch_token<S>(source: &S, registry_ids: &[String]) -> Result<AuthorizationToken>
where
    S: AuthorizationSource + ?Sized,
{
    source
        .fetch(registry_ids)
        .await?
        .into_iter()
        .next()
        .ok_or(SyncError::NoAuthorizationData)
}

/// Authorization source backed by the AWS ECR API
pub struct EcrAuthorizationSource {
    client: Client,
}

impl EcrAuthorizationSource {
    /// Build an ECR client from the standard AWS provider chain
    pub async fn new(config: &Config) -> Self {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.request_timeout)
            .build();

        let mut loader =
            aws_config::defaults(aws_config::BehaviorVersion::latest()).timeout_config(timeouts);

        if let Some(ref region) = config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        let sdk_config = loader.load().await;

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl AuthorizationSource for EcrAuthorizationSource {
    async fn fetch(&self, registry_ids: &[String]) -> Result<Vec<AuthorizationToken>> {
        // Deprecated upstream, but still the only way to scope the token
        #[allow(deprecated)]
        let output = self
            .client
            .get_authorization_token()
            .set_registry_ids(registry_id_filter(registry_ids))
            .send()
            .await
            .map_err(|e| SyncError::Fetch(DisplayErrorContext(&e).to_string()))?;

        first_authorization(output.authorization_data.unwrap_or_default())
    }
}

/// Registry ids for the request; an empty list means no filter
fn registry_id_filter(registry_ids: &[String]) -> Option<Vec<String>> {
    (!registry_ids.is_empty()).then(|| registry_ids.to_vec())
}

/// Convert the first authorization entry; later entries are never used
fn first_authorization(data: Vec<AuthorizationData>) -> Result<Vec<AuthorizationToken>> {
    let Some(first) = data.into_iter().next() else {
        return Ok(Vec::new());
    };

    match (first.authorization_token, first.proxy_endpoint) {
        (Some(token), Some(endpoint)) => Ok(vec![AuthorizationToken::new(token, endpoint)]),
        _ => Err(SyncError::Fetch(
            "authorization data is missing a token or proxy endpoint".into(),
        )),
    }
}
