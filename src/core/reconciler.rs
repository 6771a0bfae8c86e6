//! Credential reconciliation
//!
//! Matches a freshly issued authorization token against the platform's
//! registries and overwrites the stored credential of the first registry
//! whose host equals the token's proxy endpoint host.
//!
//! The platform stays the source of truth: registries and credentials are
//! never created or deleted here, only an existing credential's values are
//! replaced.

use secrecy::ExposeSecret;

use crate::core::token::{
    decode_credential, resolve_registry_host, AuthorizationToken, DecodedCredential,
};
use crate::ecr::{fetch_token, AuthorizationSource};
use crate::error::Result;
use crate::rancher::{CredentialUpdate, RegistryPlatform, RegistryRecord};

/// How a reconciliation scan ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Matched registry's single credential was updated
    Updated {
        registry_id: String,
        credential_id: String,
    },
    /// Matched registry's credential update call failed
    UpdateFailed {
        registry_id: String,
        credential_id: String,
    },
    /// Matched registry has zero or several credentials
    Ambiguous { registry_id: String, count: usize },
    /// Listing the matched registry's credentials failed
    ListFailed { registry_id: String },
    /// A registry address could not be parsed; the scan stopped there
    ParseFailed { registry_id: String, address: String },
    /// No registry host matched the token's endpoint
    NoMatch,
}

/// Per-registry decision: keep scanning or stop with an outcome
#[derive(Debug)]
enum RegistryCheck {
    Continue,
    Stop(ScanOutcome),
}

/// Applies authorization tokens to a registry platform
pub struct Reconciler<P> {
    platform: P,
}

impl<P: RegistryPlatform> Reconciler<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    /// Run one full cycle: fetch a token, then reconcile it
    pub async fn sync<S>(&self, source: &S, registry_ids: &[String]) -> Result<ScanOutcome>
    where
        S: AuthorizationSource + ?Sized,
    {
        tracing::info!("Updating ECR credentials");
        let token = fetch_token(source, registry_ids).await?;
        self.reconcile(&token).await
    }

    /// Update the platform credential matching `token`
    ///
    /// Token decoding, proxy endpoint parsing and registry listing failures
    /// abort with an error. Everything after a host match is reported through
    /// the returned `ScanOutcome` instead.
    pub async fn reconcile(&self, token: &AuthorizationToken) -> Result<ScanOutcome> {
        let credential = decode_credential(token)?;

        let registries = self.platform.list_registries().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to retrieve registries");
        })?;

        for registry in &registries {
            match self.check_registry(registry, &credential).await {
                RegistryCheck::Continue => continue,
                RegistryCheck::Stop(outcome) => return Ok(outcome),
            }
        }

        tracing::warn!(
            host = %credential.registry_host,
            registries = registries.len(),
            "Failed to find configured registry to update"
        );
        Ok(ScanOutcome::NoMatch)
    }

    async fn check_registry(
        &self,
        registry: &RegistryRecord,
        credential: &DecodedCredential,
    ) -> RegistryCheck {
        let host = match resolve_registry_host(&registry.server_address) {
            Ok(host) => host,
            Err(e) => {
                tracing::error!(
                    registry_id = %registry.id,
                    address = %registry.server_address,
                    error = %e,
                    "Failed to parse configured registry URL"
                );
                return RegistryCheck::Stop(ScanOutcome::ParseFailed {
                    registry_id: registry.id.clone(),
                    address: registry.server_address.clone(),
                });
            }
        };

        if host != credential.registry_host {
            return RegistryCheck::Continue;
        }

        let records = match self.platform.list_credentials(&registry.id).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    registry_id = %registry.id,
                    error = %e,
                    "Failed to retrieve registry credentials"
                );
                return RegistryCheck::Stop(ScanOutcome::ListFailed {
                    registry_id: registry.id.clone(),
                });
            }
        };

        let [record] = records.as_slice() else {
            tracing::warn!(
                registry_id = %registry.id,
                count = records.len(),
                "Expected exactly one credential for registry, skipping update"
            );
            return RegistryCheck::Stop(ScanOutcome::Ambiguous {
                registry_id: registry.id.clone(),
                count: records.len(),
            });
        };

        let update = CredentialUpdate {
            public_value: credential.username.clone(),
            secret_value: credential.password.expose_secret().to_string(),
        };

        let outcome = match self.platform.update_credential(record, update).await {
            Ok(_) => {
                tracing::info!(
                    credential_id = %record.id,
                    registry_id = %registry.id,
                    host = %host,
                    "Successfully updated registry credentials"
                );
                ScanOutcome::Updated {
                    registry_id: registry.id.clone(),
                    credential_id: record.id.clone(),
                }
            }
            Err(e) => {
                tracing::error!(
                    credential_id = %record.id,
                    registry_id = %registry.id,
                    error = %e,
                    "Failed to update registry credential"
                );
                ScanOutcome::UpdateFailed {
                    registry_id: registry.id.clone(),
                    credential_id: record.id.clone(),
                }
            }
        };

        RegistryCheck::Stop(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecr::MockAuthorizationSource;
    use crate::error::SyncError;
    use crate::rancher::{Links, MockRegistryPlatform, RegistryCredentialRecord};

    const ENDPOINT: &str = "https://myregistry.ecr.us-east-1.amazonaws.com";
    const HOST: &str = "myregistry.ecr.us-east-1.amazonaws.com";

    fn token() -> AuthorizationToken {
        AuthorizationToken::new("dXNlcjpwYXNz", ENDPOINT)
    }

    fn registry(id: &str, address: &str) -> RegistryRecord {
        RegistryRecord {
            id: id.into(),
            server_address: address.into(),
        }
    }

    fn credential(id: &str, registry_id: &str) -> RegistryCredentialRecord {
        RegistryCredentialRecord {
            id: id.into(),
            registry_id: registry_id.into(),
            public_value: "old".into(),
            secret_value: Some("old".into()),
            links: Links::default(),
        }
    }

    fn with_registries(registries: Vec<RegistryRecord>) -> MockRegistryPlatform {
        let mut platform = MockRegistryPlatform::new();
        platform
            .expect_list_registries()
            .times(1)
            .returning(move || Ok(registries.clone()));
        platform
    }

    #[tokio::test]
    async fn test_updates_single_matching_credential() {
        let mut platform = with_registries(vec![
            registry("1sp1", "https://123.ecr.aws.com"),
            registry("1sp2", HOST),
        ]);
        platform
            .expect_list_credentials()
            .withf(|id| id == "1sp2")
            .times(1)
            .returning(|_| Ok(vec![credential("1cr1", "1sp2")]));
        platform
            .expect_update_credential()
            .withf(|record, update| {
                record.id == "1cr1"
                    && update.public_value == "user"
                    && update.secret_value == "pass"
            })
            .times(1)
            .returning(|record, update| {
                let mut updated = record.clone();
                updated.public_value = update.public_value;
                updated.secret_value = Some(update.secret_value);
                Ok(updated)
            });

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Updated {
                registry_id: "1sp2".into(),
                credential_id: "1cr1".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_only_first_match_is_acted_on() {
        let mut platform = with_registries(vec![
            registry("1sp1", ENDPOINT),
            registry("1sp2", HOST),
        ]);
        platform
            .expect_list_credentials()
            .withf(|id| id == "1sp1")
            .times(1)
            .returning(|_| Ok(vec![credential("1cr1", "1sp1")]));
        platform
            .expect_update_credential()
            .times(1)
            .returning(|record, _| Ok(record.clone()));

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Updated { registry_id, .. } if registry_id == "1sp1"));
    }

    #[tokio::test]
    async fn test_no_credentials_skips_update() {
        let mut platform = with_registries(vec![registry("1sp1", HOST)]);
        platform
            .expect_list_credentials()
            .times(1)
            .returning(|_| Ok(vec![]));
        platform.expect_update_credential().never();

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Ambiguous {
                registry_id: "1sp1".into(),
                count: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_multiple_credentials_skips_update() {
        let mut platform = with_registries(vec![
            registry("1sp1", HOST),
            registry("1sp2", HOST),
        ]);
        platform
            .expect_list_credentials()
            .times(1)
            .returning(|_| Ok(vec![credential("1cr1", "1sp1"), credential("1cr2", "1sp1")]));
        platform.expect_update_credential().never();

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Ambiguous {
                registry_id: "1sp1".into(),
                count: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_no_match_is_not_an_error() {
        let mut platform = with_registries(vec![
            registry("1sp1", "https://123.ecr.aws.com"),
            registry("1sp2", "ecr-registry-2"),
            // Ports are compared verbatim
            registry("1sp3", "https://myregistry.ecr.us-east-1.amazonaws.com:443"),
        ]);
        platform.expect_list_credentials().never();
        platform.expect_update_credential().never();

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(outcome, ScanOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_unparseable_address_stops_scan() {
        let mut platform = with_registries(vec![
            registry("1sp1", "https://[broken"),
            registry("1sp2", HOST),
        ]);
        platform.expect_list_credentials().never();
        platform.expect_update_credential().never();

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::ParseFailed {
                registry_id: "1sp1".into(),
                address: "https://[broken".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_update_failure_stops_scan() {
        let mut platform = with_registries(vec![
            registry("1sp1", HOST),
            registry("1sp2", HOST),
        ]);
        platform
            .expect_list_credentials()
            .times(1)
            .returning(|_| Ok(vec![credential("1cr1", "1sp1")]));
        platform
            .expect_update_credential()
            .times(1)
            .returning(|_, _| Err(SyncError::Platform("409 Conflict".into())));

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::UpdateFailed {
                registry_id: "1sp1".into(),
                credential_id: "1cr1".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_credential_listing_failure_stops_scan() {
        let mut platform = with_registries(vec![registry("1sp1", HOST)]);
        platform
            .expect_list_credentials()
            .times(1)
            .returning(|_| Err(SyncError::Platform("500".into())));
        platform.expect_update_credential().never();

        let outcome = Reconciler::new(platform).reconcile(&token()).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::ListFailed {
                registry_id: "1sp1".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_registry_listing_failure_aborts_cycle() {
        let mut platform = MockRegistryPlatform::new();
        platform
            .expect_list_registries()
            .returning(|| Err(SyncError::Platform("401 Unauthorized".into())));
        platform.expect_update_credential().never();

        let result = Reconciler::new(platform).reconcile(&token()).await;
        assert!(matches!(result, Err(SyncError::Platform(_))));
    }

    #[tokio::test]
    async fn test_bad_token_aborts_before_platform_calls() {
        let mut platform = MockRegistryPlatform::new();
        platform.expect_list_registries().never();

        let reconciler = Reconciler::new(platform);
        let result = reconciler
            .reconcile(&AuthorizationToken::new("dXNlcnBhc3M=", ENDPOINT))
            .await;
        assert!(matches!(result, Err(SyncError::TokenFormat)));

        let result = reconciler
            .reconcile(&AuthorizationToken::new("dXNlcjpwYXNz", "not a url"))
            .await;
        assert!(matches!(result, Err(SyncError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_sync_fetches_then_reconciles() {
        let mut source = MockAuthorizationSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(vec![AuthorizationToken::new("dXNlcjpwYXNz", ENDPOINT)]));

        let mut platform = with_registries(vec![registry("1sp1", HOST)]);
        platform
            .expect_list_credentials()
            .returning(|_| Ok(vec![credential("1cr1", "1sp1")]));
        platform
            .expect_update_credential()
            .times(1)
            .returning(|record, _| Ok(record.clone()));

        let outcome = Reconciler::new(platform)
            .sync(&source, &[])
            .await
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::Updated { .. }));
    }

    #[tokio::test]
    async fn test_sync_without_authorization_data_touches_nothing() {
        let mut source = MockAuthorizationSource::new();
        source.expect_fetch().returning(|_| Ok(vec![]));

        let mut platform = MockRegistryPlatform::new();
        platform.expect_list_registries().never();

        let result = Reconciler::new(platform).sync(&source, &[]).await;
        assert!(matches!(result, Err(SyncError::NoAuthorizationData)));
    }
}
