//! Rancher API client
//!
//! Talks to the Rancher v1-style JSON API with HTTP basic auth using the
//! environment API key pair.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::Config;
use crate::error::{Result, SyncError};
use crate::rancher::platform::{
    CredentialUpdate, RegistryCredentialRecord, RegistryPlatform, RegistryRecord,
};

const REGISTRIES: &str = "registries";
const REGISTRY_CREDENTIALS: &str = "registrycredentials";

/// Upper bound on followed `pagination.next` links per listing
const MAX_PAGES: usize = 100;

/// Rancher collection envelope
#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    next: Option<String>,
}

/// Rancher API client
pub struct RancherClient {
    client: Client,
    base_url: String,
    access_key: String,
    secret_key: SecretString,
}

impl RancherClient {
    /// Create a client from the validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ecr-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.platform_url.as_str().trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    /// Resource URL for a credential, preferring the server-provided self link
    fn credential_url(&self, credential: &RegistryCredentialRecord) -> String {
        match &credential.links.self_link {
            Some(link) if !link.is_empty() => link.clone(),
            _ => format!("{}/{}", self.collection_url(REGISTRY_CREDENTIALS), credential.id),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.access_key, Some(self.secret_key.expose_secret()))
    }

    /// Fetch every page of a collection
    async fn list_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = self.collection_url(collection);
        let response = self.request(Method::GET, &url).query(query).send().await?;
        let mut page: Collection<T> = parse_response(response, &url).await?;

        let mut items = std::mem::take(&mut page.data);
        let mut pages = 1;

        while let Some(next) = page.pagination.and_then(|p| p.next) {
            if pages >= MAX_PAGES {
                tracing::warn!(collection, pages, "Stopping pagination at page limit");
                break;
            }
            let response = self.request(Method::GET, &next).send().await?;
            page = parse_response(response, &next).await?;
            items.append(&mut page.data);
            pages += 1;
        }

        Ok(items)
    }
}

/// Check the status and decode a JSON body
async fn parse_response<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Platform(format!(
            "{} returned {}: {}",
            url, status, body
        )));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl RegistryPlatform for RancherClient {
    async fn list_registries(&self) -> Result<Vec<RegistryRecord>> {
        self.list_all(REGISTRIES, &[]).await
    }

    async fn list_credentials(&self, registry_id: &str) -> Result<Vec<RegistryCredentialRecord>> {
        self.list_all(REGISTRY_CREDENTIALS, &[("registryId", registry_id)])
            .await
    }

    async fn update_credential(
        &self,
        credential: &RegistryCredentialRecord,
        update: CredentialUpdate,
    ) -> Result<RegistryCredentialRecord> {
        let url = self.credential_url(credential);
        let response = self
            .request(Method::PUT, &url)
            .json(&update)
            .send()
            .await?;

        parse_response(response, &url).await
    }
}
