//! Core functionality for ecr-sync
//!
//! This module contains the reconciliation logic:
//! - Runtime configuration
//! - Authorization token decoding and host resolution
//! - Credential reconciliation against the platform
//! - The fixed-interval scheduler

pub mod config;
pub mod reconciler;
pub mod scheduler;
pub mod token;

pub use config::Config;
pub use reconciler::{Reconciler, ScanOutcome};
pub use scheduler::Scheduler;
pub use token::{AuthorizationToken, DecodedCredential};
