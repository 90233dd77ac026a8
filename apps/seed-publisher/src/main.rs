use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use seed_publisher::cli::Cli;
use seed_publisher::config::Config;
use seed_publisher::publisher::{Publisher, worker_count};
use seed_publisher::telemetry::logging::{self, LogConfig};
use seed_storage::SeedStorage;
use seedbank_client::{CredentialVerifier, SeedBankClient};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogConfig {
        level: cli.log_level,
        file: cli.log_file.clone(),
    })?;

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let verifier = CredentialVerifier::from_pem_file(&config.verify_key)
        .with_context(|| format!("loading verification key {}", config.verify_key.display()))?;
    let client = Arc::new(SeedBankClient::new(config.client_config(), verifier));
    let storage = Arc::new(SeedStorage::new());
    let publisher = Publisher::new(Arc::clone(&storage), client);

    // The search engine attaches to `storage` with this many workers.
    let workers = worker_count(cli.threads);
    info!(
        target: "seedbank::publisher",
        host = %config.host,
        port = config.port,
        workers,
        "seed publisher starting"
    );

    let session = publisher.bootstrap()?;
    info!(
        target: "seedbank::publisher",
        filter = %session.filter,
        expires_at = %session.expires_at,
        "searching"
    );

    let report = publisher.pump(cli.seed_limit());
    info!(
        target: "seedbank::publisher",
        submitted = report.submitted,
        skipped = report.skipped,
        queued = storage.len(),
        "queue drained"
    );
    if let Some((seed, kind)) = report.unsent {
        anyhow::bail!(
            "submitting seed from start {} failed ({kind})",
            seed.start()
        );
    }
    Ok(())
}
