//! Companies that filed during a given month

use crate::dataset::Dataset;
use crate::dates::{date_field, MonthYear};
use crate::pipeline::{Derive, FieldPath, Filter, Lookup, Pipeline, Project, Row};
use crate::runner::Report;
use filingforge_common::db::models::{COMPANY_ID_FIELD, FILING_DATES_PATH, ID_FIELD};
use filingforge_common::Collection;
use serde_json::Value;

pub const OUTPUT_FILE: &str = "current-month-filings.json";

const PERIODS_FIELD: &str = "filingPeriods";
const COMPANY_FIELD: &str = "companyData";
const FILINGS_FIELD: &str = "filingsData";

/// Filing histories with at least one filing date in the target month,
/// each paired with its company profile.
///
/// Output rows are `{companyData, filingsData}`; a history appears once no
/// matter how many of its dates fall in the month.
#[derive(Debug, Clone, Copy)]
pub struct MonthlyFilingReport {
    period: MonthYear,
}

impl MonthlyFilingReport {
    pub fn current() -> Self {
        Self::for_period(MonthYear::current())
    }

    pub fn for_period(period: MonthYear) -> Self {
        Self { period }
    }

    pub fn period(&self) -> MonthYear {
        self.period
    }

    fn pipeline(&self) -> Pipeline {
        let target = self.period;
        let dates_path = FieldPath::parse(FILING_DATES_PATH);

        Pipeline::new()
            .stage(Derive::new(PERIODS_FIELD, move |row| {
                let dates = dates_path.get(row)?.as_array()?;
                let periods = dates
                    .iter()
                    .filter_map(|date| date_field(Some(date), FILING_DATES_PATH))
                    .map(|date| MonthYear::of(date).to_value())
                    .collect();
                Some(Value::Array(periods))
            }))
            .stage(Filter::new(move |row| {
                row.get(PERIODS_FIELD)
                    .and_then(Value::as_array)
                    .is_some_and(|periods| {
                        periods
                            .iter()
                            .any(|p| MonthYear::from_value(p) == Some(target))
                    })
            }))
            .stage(Lookup::new(
                Collection::Companies,
                COMPANY_ID_FIELD,
                ID_FIELD,
                COMPANY_FIELD,
            ))
            .stage(
                Project::new()
                    .field(COMPANY_FIELD, COMPANY_FIELD)
                    .root_without(FILINGS_FIELD, &[COMPANY_FIELD, PERIODS_FIELD]),
            )
    }
}

impl Report for MonthlyFilingReport {
    type Output = Row;

    fn name(&self) -> &'static str {
        "monthly-filings"
    }

    fn sources(&self) -> &'static [Collection] {
        &[Collection::Filings, Collection::Companies]
    }

    fn file_name(&self) -> String {
        OUTPUT_FILE.to_string()
    }

    fn evaluate(&self, dataset: &Dataset) -> Vec<Row> {
        let filings = dataset.rows(Collection::Filings).to_vec();
        self.pipeline().run(filings, dataset)
    }
}
