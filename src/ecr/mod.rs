//! AWS ECR integration
//!
//! Fetches short-lived registry authorization tokens.

pub mod auth;

pub use auth::{fetch_token, AuthorizationSource, EcrAuthorizationSource};

#[cfg(test)]
pub use auth::MockAuthorizationSource;
