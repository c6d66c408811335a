//! Revenue per industry description for a year read from stdin
//!
//! Writes `revenue-by-sicDescription-<year>.json` into the configured output
//! directory. An invalid year or any storage failure is logged and nothing
//! is written.

use filingforge_common::{config::AppConfig, metrics, telemetry, VERSION};
use filingforge_reports::revenue_by_sic::prompt_year;
use filingforge_reports::{run_with_config, RevenueBySicReport};
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

    info!("Starting FilingForge revenue-by-sic v{}", VERSION);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return;
        }
    };

    metrics::register_metrics();

    let year = match prompt_year().await {
        Ok(year) => year,
        Err(e) => {
            error!(error = %e, "No usable year given");
            return;
        }
    };

    if let Err(e) = run_with_config(&config, &RevenueBySicReport::new(year)).await {
        error!(error = %e, year, "Revenue by SIC report failed");
    }
}
