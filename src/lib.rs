//! ecr-sync - keeps a Rancher registry credential fresh with AWS ECR tokens
//!
//! This library fetches short-lived ECR authorization tokens, matches them
//! against the registries configured on a Rancher platform, and overwrites the
//! matching registry's stored credential on a fixed schedule.

pub mod cli;
pub mod core;
pub mod ecr;
pub mod error;
pub mod rancher;

pub use error::{Result, SyncError};
