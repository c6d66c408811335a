//! Companies that filed during the current month
//!
//! Writes `current-month-filings.json` into the configured output directory.
//! Failures are logged and nothing is written.

use filingforge_common::{config::AppConfig, metrics, telemetry, VERSION};
use filingforge_reports::{run_with_config, MonthlyFilingReport};
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

    info!("Starting FilingForge monthly-filings v{}", VERSION);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return;
        }
    };

    metrics::register_metrics();

    let report = MonthlyFilingReport::current();
    let period = report.period();
    info!(month = period.month, year = period.year, "Collecting filings");

    if let Err(e) = run_with_config(&config, &report).await {
        error!(error = %e, "Monthly filings report failed");
    }
}
