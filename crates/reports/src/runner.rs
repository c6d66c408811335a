//! Report driver: load, evaluate, write

use crate::dataset::Dataset;
use crate::errors::ReportError;
use crate::output::write_report;
use filingforge_common::config::AppConfig;
use filingforge_common::metrics::ReportMetrics;
use filingforge_common::{Collection, DocumentStore, PgDocumentStore, StoreSession};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// A read-only aggregation over the stored collections
pub trait Report {
    type Output: Serialize;

    fn name(&self) -> &'static str;

    /// Collections the report reads
    fn sources(&self) -> &'static [Collection];

    fn file_name(&self) -> String;

    fn evaluate(&self, dataset: &Dataset) -> Vec<Self::Output>;
}

/// Where a report landed and how many entries it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRun {
    pub path: PathBuf,
    pub rows: usize,
}

/// Run a report against `store`, writing its result into `output_dir`.
///
/// The store is released once the sources are loaded, whether loading
/// succeeded or not. Nothing is written when loading fails.
#[instrument(skip_all, fields(report = report.name()))]
pub async fn run_report<S, R>(store: S, report: &R, output_dir: &Path) -> Result<ReportRun, ReportError>
where
    S: DocumentStore,
    R: Report,
{
    let metrics = ReportMetrics::start(report.name());

    let session = StoreSession::open(store);
    let loaded = Dataset::load(&*session, report.sources()).await;
    let dataset = session.release_with(loaded).await?;

    let results = report.evaluate(&dataset);
    let path = output_dir.join(report.file_name());
    write_report(&path, &results)?;

    metrics.finish(results.len());
    info!(path = %path.display(), rows = results.len(), "Report written");

    Ok(ReportRun {
        path,
        rows: results.len(),
    })
}

/// Connect with the configured database settings and run the report
pub async fn run_with_config<R: Report>(config: &AppConfig, report: &R) -> Result<ReportRun, ReportError> {
    let store = PgDocumentStore::connect(&config.database).await?;
    run_report(store, report, &config.reports.output_dir).await
}
