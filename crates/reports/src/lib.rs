//! FilingForge Reports
//!
//! Read-only aggregations over ingested registry data. Each report loads
//! the collections it needs, runs a stage pipeline over them and writes a
//! pretty-printed JSON array:
//! - [`MonthlyFilingReport`]: companies that filed in a given month
//! - [`RevenueBySicReport`]: yearly revenue per industry description
//! - [`SicFrequencyReport`]: company count per industry code

pub mod dataset;
pub mod dates;
pub mod errors;
pub mod monthly_filings;
pub mod output;
pub mod pipeline;
pub mod revenue_by_sic;
pub mod runner;
pub mod sic_frequency;

pub use dataset::Dataset;
pub use errors::ReportError;
pub use monthly_filings::MonthlyFilingReport;
pub use revenue_by_sic::RevenueBySicReport;
pub use runner::{run_report, run_with_config, Report, ReportRun};
pub use sic_frequency::SicFrequencyReport;
