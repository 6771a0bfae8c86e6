//! Platform registry API surface used by the reconciler

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A container registry configured on the platform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub id: String,
    #[serde(default)]
    pub server_address: String,
}

/// Resource links attached to a platform record
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Option<String>,
}

/// Stored username/password for a registry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCredentialRecord {
    pub id: String,
    #[serde(default)]
    pub registry_id: String,
    #[serde(default)]
    pub public_value: String,
    /// Usually withheld by the API on reads
    #[serde(default)]
    pub secret_value: Option<String>,
    #[serde(default)]
    pub links: Links,
}

/// New credential material for an update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUpdate {
    pub public_value: String,
    pub secret_value: String,
}

/// Operations the reconciler needs from the platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryPlatform: Send + Sync {
    /// List every registry known to the platform
    async fn list_registries(&self) -> Result<Vec<RegistryRecord>>;

    /// List credentials belonging to one registry
    async fn list_credentials(&self, registry_id: &str) -> Result<Vec<RegistryCredentialRecord>>;

    /// Overwrite a credential's public/secret values
    async fn update_credential(
        &self,
        credential: &RegistryCredentialRecord,
        update: CredentialUpdate,
    ) -> Result<RegistryCredentialRecord>;
}
