//! CLI module for ecr-sync
//!
//! Argument and environment parsing using clap.

pub mod commands;

pub use commands::Cli;
