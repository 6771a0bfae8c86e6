//! Authorization token decoding and host resolution
//!
//! An ECR authorization token is `base64("<user>:<password>")` paired with the
//! registry's proxy endpoint. Registry hosts are compared as raw strings, so
//! the helpers here extract the authority exactly as written, without the
//! case or port normalization `url::Url` applies.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{Result, SyncError};

/// Raw authorization entry as returned by the registry authorization service
#[derive(Debug, Clone)]
pub struct AuthorizationToken {
    /// Base64 encoded `<user>:<password>`
    pub token: SecretString,
    /// Registry endpoint the token is valid for
    pub proxy_endpoint: String,
}

impl AuthorizationToken {
    pub fn new(token: impl Into<String>, proxy_endpoint: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            proxy_endpoint: proxy_endpoint.into(),
        }
    }
}

/// Credential decoded from an authorization token, valid for one cycle
#[derive(Debug, Clone)]
pub struct DecodedCredential {
    pub username: String,
    pub password: SecretString,
    /// Host of the token's proxy endpoint
    pub registry_host: String,
}

/// Decode a token into username, password and registry host
///
/// ## Errors
///
/// - `Decode` - the token is not base64 or not UTF-8
/// - `TokenFormat` - the decoded text is not exactly `<user>:<password>`
/// - `InvalidUrl` - the proxy endpoint does not parse or has no host
pub fn decode_credential(token: &AuthorizationToken) -> Result<DecodedCredential> {
    let (username, password) = decode_user_password(token.token.expose_secret())?;
    let registry_host = proxy_host(&token.proxy_endpoint)?;

    Ok(DecodedCredential {
        username,
        password: SecretString::from(password),
        registry_host,
    })
}

/// Split `base64("<user>:<password>")` into its two halves
pub fn decode_user_password(encoded: &str) -> Result<(String, String)> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| SyncError::Decode(e.to_string()))?;
    let decoded =
        String::from_utf8(bytes).map_err(|_| SyncError::Decode("token is not valid UTF-8".into()))?;

    // Anything other than exactly one separator is ambiguous
    let parts: Vec<&str> = decoded.split(':').collect();
    match parts.as_slice() {
        [user, password] => Ok((user.to_string(), password.to_string())),
        _ => Err(SyncError::TokenFormat),
    }
}

/// Host of the token's proxy endpoint; an empty host is an error
pub fn proxy_host(endpoint: &str) -> Result<String> {
    Url::parse(endpoint).map_err(|e| SyncError::invalid_url(endpoint, e))?;

    match raw_authority(endpoint) {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(SyncError::invalid_url(endpoint, "proxy endpoint has no host")),
    }
}

/// Resolve a registry's configured server address into a host string
///
/// Addresses with a scheme resolve to their authority. Addresses configured
/// without one (e.g. `ecr-registry-2` or `myregistry.example.com`) or with an
/// empty authority resolve to their path. A schemeless `host:port` resolves
/// to the whole address rather than being read as `scheme:path`.
pub fn resolve_registry_host(address: &str) -> Result<String> {
    if let Some(host) = bare_host_port(address) {
        return Ok(host.to_string());
    }

    match Url::parse(address) {
        Ok(url) => match raw_authority(address) {
            Some(host) if !host.is_empty() => Ok(host.to_string()),
            _ => Ok(url.path().to_string()),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(strip_query(address).to_string()),
        Err(e) => Err(SyncError::invalid_url(address, e)),
    }
}

/// Authority section of `scheme://authority/...`, user-info removed
fn raw_authority(raw: &str) -> Option<&str> {
    let (_, rest) = raw.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];

    Some(
        authority
            .rsplit_once('@')
            .map(|(_, host)| host)
            .unwrap_or(authority),
    )
}

/// `host:port` with no scheme, no path and a numeric port
fn bare_host_port(raw: &str) -> Option<&str> {
    if raw.contains("://") {
        return None;
    }
    let (host, port) = raw.rsplit_once(':')?;
    let valid = !host.is_empty()
        && !host.contains(['/', '?', '#', '@'])
        && !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit());

    valid.then_some(raw)
}

fn strip_query(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    &raw[..end]
}
