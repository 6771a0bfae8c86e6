//! Rancher platform integration
//!
//! - Registry and registry credential records
//! - The `RegistryPlatform` trait the reconciler works against
//! - An HTTP client implementing it

pub mod client;
pub mod platform;

pub use client::RancherClient;
pub use platform::{
    CredentialUpdate, Links, RegistryCredentialRecord, RegistryPlatform, RegistryRecord,
};

#[cfg(test)]
pub use platform::MockRegistryPlatform;
