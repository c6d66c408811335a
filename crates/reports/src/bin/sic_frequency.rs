//! Company count per industry classification code
//!
//! Writes `sic-results.json` into the configured output directory.

use filingforge_common::{config::AppConfig, metrics, telemetry, VERSION};
use filingforge_reports::{run_with_config, SicFrequencyReport};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::load();
    telemetry::init(
        &config
            .as_ref()
            .map(|c| c.observability.clone())
            .unwrap_or_default(),
    );

    info!("Starting FilingForge sic-frequency v{}", VERSION);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return;
        }
    };

    metrics::register_metrics();

    if let Err(e) = run_with_config(&config, &SicFrequencyReport).await {
        error!(error = %e, "SIC frequency report failed");
    }
}
