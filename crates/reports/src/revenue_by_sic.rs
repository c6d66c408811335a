//! Reported revenue per industry classification for one year

use crate::dataset::Dataset;
use crate::dates::date_field;
use crate::errors::ReportError;
use crate::pipeline::{
    group::serialize_decimal_number, sort_desc_by, Derive, FieldPath, Filter, GroupBy, JoinKey,
    Lookup, Pipeline, Retain, Row, Unwind,
};
use crate::runner::Report;
use chrono::Datelike;
use filingforge_common::Collection;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub const YEAR_PROMPT: &str = "Enter the year for which you want to find revenue by SIC description: ";

const REVENUE_PATH: &str = "facts.us-gaap.Revenues.units.USD";
const COMPANY_FIELD: &str = "companyData";
const SIC_DESCRIPTION_PATH: &str = "companyData.sicDescription";
const YEAR_FIELD: &str = "startYear";

/// Output entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBySic {
    pub classification_description: Value,
    #[serde(serialize_with = "serialize_decimal_number")]
    pub total_revenue: Decimal,
}

/// USD revenue facts whose reporting period starts in `year`, summed per
/// `sicDescription` of the reporting company, largest first.
#[derive(Debug, Clone, Copy)]
pub struct RevenueBySicReport {
    year: i32,
}

impl RevenueBySicReport {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    fn pipeline(&self) -> Pipeline {
        let start_path = FieldPath::parse(&format!("{REVENUE_PATH}.start"));

        Pipeline::new()
            .stage(Lookup::new(Collection::Companies, "cik", "cik", COMPANY_FIELD).key(JoinKey::Cik))
            .stage(Retain::new(&[REVENUE_PATH, SIC_DESCRIPTION_PATH]))
            .stage(Unwind::new(REVENUE_PATH))
            .stage(Derive::new(YEAR_FIELD, move |row| {
                date_field(start_path.get(row), "start").map(|date| json!(date.year()))
            }))
            .stage(Filter::eq(YEAR_FIELD, json!(self.year)))
    }
}

impl Report for RevenueBySicReport {
    type Output = RevenueBySic;

    fn name(&self) -> &'static str {
        "revenue-by-sic"
    }

    fn sources(&self) -> &'static [Collection] {
        &[Collection::Accounting, Collection::Companies]
    }

    fn file_name(&self) -> String {
        format!("revenue-by-sicDescription-{}.json", self.year)
    }

    fn evaluate(&self, dataset: &Dataset) -> Vec<RevenueBySic> {
        let rows = self.pipeline().run(revenue_facts(dataset), dataset);

        let mut totals: Vec<RevenueBySic> = GroupBy::new(SIC_DESCRIPTION_PATH)
            .sum("totalRevenue", &format!("{REVENUE_PATH}.val"))
            .apply(&rows)
            .into_iter()
            .map(|group| RevenueBySic {
                total_revenue: group.sum("totalRevenue"),
                classification_description: group.key,
            })
            .collect();

        sort_desc_by(&mut totals, |entry| entry.total_revenue);
        totals
    }
}

/// Accounting rows cut down to the join key and the revenue series.
///
/// Facts documents run to megabytes; nothing else is copied.
fn revenue_facts(dataset: &Dataset) -> Vec<Row> {
    let slim = Retain::new(&["cik", REVENUE_PATH]);
    dataset
        .rows(Collection::Accounting)
        .iter()
        .map(|row| slim.select(row))
        .collect()
}

/// Parse a year typed by the user
pub fn parse_year(input: &str) -> Result<i32, ReportError> {
    input.trim().parse().map_err(|_| ReportError::InvalidYear {
        input: input.trim().to_string(),
    })
}

/// Ask for the target year on stdout and read one line from stdin
pub async fn prompt_year() -> Result<i32, ReportError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(YEAR_PROMPT.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    parse_year(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn facts(cik: Value, entries: Value) -> Row {
        row(json!({
            "cik": cik,
            "entityName": "X",
            "facts": {"us-gaap": {"Revenues": {"units": {"USD": entries}}}}
        }))
    }

    fn dataset() -> Dataset {
        Dataset::default()
            .with(
                Collection::Companies,
                vec![
                    row(json!({"_id": "a", "cik": "0000000001", "sicDescription": "Mining"})),
                    row(json!({"_id": "b", "cik": "2", "sicDescription": "Retail"})),
                    row(json!({"_id": "c", "cik": "3", "sicDescription": "Mining"})),
                ],
            )
            .with(
                Collection::Accounting,
                vec![
                    facts(
                        json!(1),
                        json!([
                            {"start": "2023-01-01", "val": 100},
                            {"start": "2022-01-01", "val": 10},
                        ]),
                    ),
                    facts(json!(3), json!([{"start": "2023-04-01", "val": 50}])),
                    facts(json!(2), json!([{"start": "2023-01-01", "val": 70.25}])),
                    facts(json!(2), json!([{"start": "2023-01-01", "val": "n/a"}])),
                    facts(json!(99), json!([{"start": "2023-01-01", "val": 1000}])),
                    row(json!({"cik": 1, "facts": {"us-gaap": {}}})),
                ],
            )
    }

    #[test]
    fn test_revenue_summed_per_classification() {
        let out = RevenueBySicReport::new(2023).evaluate(&dataset());

        assert_eq!(
            out,
            vec![
                RevenueBySic {
                    classification_description: json!("Mining"),
                    total_revenue: Decimal::from(150),
                },
                RevenueBySic {
                    classification_description: json!("Retail"),
                    total_revenue: Decimal::from_str("70.25").unwrap(),
                },
            ]
        );
        assert_eq!(
            serde_json::to_value(&out[0]).unwrap(),
            json!({"classificationDescription": "Mining", "totalRevenue": 150})
        );
    }

    #[test]
    fn test_grouped_rows_carry_only_revenue_and_classification() {
        let mut big = facts(json!(1), json!([{"start": "2023-01-01", "val": 5, "form": "10-K"}]));
        big["facts"]["us-gaap"]
            .as_object_mut()
            .unwrap()
            .insert("Assets".to_string(), json!({"units": {"USD": [{"val": 1}]}}));
        let dataset = Dataset::default()
            .with(
                Collection::Companies,
                vec![row(json!({"_id": "a", "cik": "1", "sicDescription": "Mining", "tickers": ["M"]}))],
            )
            .with(Collection::Accounting, vec![big]);

        let report = RevenueBySicReport::new(2023);
        let rows = report.pipeline().run(revenue_facts(&dataset), &dataset);

        assert_eq!(
            rows,
            vec![row(json!({
                "facts": {"us-gaap": {"Revenues": {"units": {"USD": {"start": "2023-01-01", "val": 5, "form": "10-K"}}}}},
                "companyData": {"sicDescription": "Mining"},
                "startYear": 2023
            }))]
        );
    }

    #[test]
    fn test_other_years_excluded() {
        let out = RevenueBySicReport::new(2022).evaluate(&dataset());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].total_revenue, Decimal::from(10));
    }

    #[test]
    fn test_no_facts_for_year() {
        assert!(RevenueBySicReport::new(1999).evaluate(&dataset()).is_empty());
    }

    #[test]
    fn test_file_name_carries_year() {
        assert_eq!(
            RevenueBySicReport::new(2023).file_name(),
            "revenue-by-sicDescription-2023.json"
        );
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2023\n").unwrap(), 2023);
        assert_eq!(parse_year("  1999 ").unwrap(), 1999);
        assert!(matches!(parse_year("twenty"), Err(ReportError::InvalidYear { .. })));
        assert!(matches!(parse_year(""), Err(ReportError::InvalidYear { .. })));
        assert!(matches!(parse_year("2023.5"), Err(ReportError::InvalidYear { .. })));
    }
}
