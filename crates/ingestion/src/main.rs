//! FilingForge Ingestion
//!
//! Loads EDGAR submissions for every CIK in the ticker file:
//! 1. Reads identifiers in file order
//! 2. Fetches each submissions document
//! 3. Stores profile facts and filing history as linked documents
//!
//! A CIK the registry does not know is skipped. Any other failure stops
//! the run and the process exits with status 1.

mod errors;
mod processor;
mod tickers;

use errors::IngestionError;
use filingforge_common::{
    config::AppConfig, metrics, telemetry, EdgarClient, PgDocumentStore, VERSION,
};
use processor::run_ingestion;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load();
    telemetry::init(
        &config
            .as_ref()
            .map(|c| c.observability.clone())
            .unwrap_or_default(),
    );

    info!("Starting FilingForge Ingestion v{}", VERSION);

    let config = config.map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        IngestionError::ConfigError(e.to_string())
    })?;

    metrics::register_metrics();

    if let Err(e) = ingest(&config).await {
        error!(error = %e, cik = ?e.cik(), code = ?e.error_code(), "Ingestion failed");
        return Err(e.into());
    }

    Ok(())
}

async fn ingest(config: &AppConfig) -> Result<(), IngestionError> {
    let identifiers: Vec<_> = tickers::load_identifiers(&config.ingest.tickers_path)?
        .into_iter()
        .map(|entry| entry.cik)
        .collect();

    let fetcher = EdgarClient::new(&config.registry)?;
    let store = PgDocumentStore::connect(&config.database).await?;

    info!(identifiers = identifiers.len(), "Identifiers loaded");
    run_ingestion(store, fetcher, identifiers).await?;

    Ok(())
}
