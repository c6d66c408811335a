//! How many companies fall under each industry classification code

use crate::dataset::Dataset;
use crate::pipeline::{sort_desc_by, GroupBy};
use crate::runner::Report;
use filingforge_common::Collection;
use serde::Serialize;
use serde_json::Value;

pub const OUTPUT_FILE: &str = "sic-results.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SicFrequency {
    pub classification_code: Value,
    pub count: u64,
    pub classification_description: Value,
}

/// Profiles grouped by `sic`, most common first.
///
/// The description is taken from the first profile stored under each code.
/// Codes with equal counts keep the order in which they were first seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct SicFrequencyReport;

impl Report for SicFrequencyReport {
    type Output = SicFrequency;

    fn name(&self) -> &'static str {
        "sic-frequency"
    }

    fn sources(&self) -> &'static [Collection] {
        &[Collection::Companies]
    }

    fn file_name(&self) -> String {
        OUTPUT_FILE.to_string()
    }

    fn evaluate(&self, dataset: &Dataset) -> Vec<SicFrequency> {
        let mut frequencies: Vec<SicFrequency> = GroupBy::new("sic")
            .count("count")
            .first("description", "sicDescription")
            .apply(dataset.rows(Collection::Companies))
            .into_iter()
            .map(|group| SicFrequency {
                count: group.count("count"),
                classification_description: group.first("description"),
                classification_code: group.key,
            })
            .collect();

        sort_desc_by(&mut frequencies, |entry| entry.count);
        frequencies
    }
}
