//! ecr-sync - Rancher registry credential refresher
//!
//! Runs unattended: refreshes the ECR credential once at startup and then
//! every interval until the process is killed.
//!
//! Available as the `ecr-sync` command.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ecr_sync::cli::Cli;
use ecr_sync::core::{Config, Reconciler, Scheduler};
use ecr_sync::ecr::EcrAuthorizationSource;
use ecr_sync::error::Result;
use ecr_sync::rancher::RancherClient;

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_cli(Cli::parse())?;

    tracing::info!(
        platform = %config.platform_url,
        registry_ids = ?config.registry_ids,
        interval_secs = config.interval.as_secs(),
        once = config.once,
        "Starting ecr-sync"
    );

    let source = EcrAuthorizationSource::new(&config).await;
    let reconciler = Reconciler::new(RancherClient::new(&config)?);
    let scheduler = Scheduler::new(config.interval);

    let cycle = || reconciler.sync(&source, &config.registry_ids);

    if config.once {
        scheduler.run_ticks(1, cycle).await;
    } else {
        scheduler.run(cycle).await;
    }

    Ok(())
}
