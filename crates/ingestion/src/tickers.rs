//! Identifier source: the registry's ticker → CIK mapping file
//!
//! The file is a JSON object whose values look like
//! `{"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}`.
//! Keys are arbitrary; the order they appear in is the processing order.

use crate::errors::IngestionError;
use filingforge_common::db::models::Cik;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// One entry of the ticker file
#[derive(Debug, Clone, PartialEq)]
pub struct TickerEntry {
    pub key: String,
    pub cik: Cik,
    pub ticker: Option<String>,
}

/// Read the identifier file from disk
pub fn load_identifiers(path: &Path) -> Result<Vec<TickerEntry>, IngestionError> {
    let raw = std::fs::read_to_string(path).map_err(|source| IngestionError::IdentifierSource {
        path: path.display().to_string(),
        source,
    })?;

    let entries = parse_identifiers(&raw)?;
    info!(path = %path.display(), count = entries.len(), "Identifier source loaded");
    Ok(entries)
}

/// Parse the identifier file contents, keeping source order
pub fn parse_identifiers(raw: &str) -> Result<Vec<TickerEntry>, IngestionError> {
    let map: Map<String, Value> = serde_json::from_str(raw)
        .map_err(|e| IngestionError::MalformedIdentifiers(e.to_string()))?;

    map.into_iter()
        .map(|(key, value)| {
            let cik = value
                .get("cik_str")
                .and_then(Cik::from_json)
                .ok_or_else(|| {
                    IngestionError::MalformedIdentifiers(format!(
                        "entry {} has no numeric cik_str",
                        key
                    ))
                })?;
            let ticker = value
                .get("ticker")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(TickerEntry { key, cik, ticker })
        })
        .collect()
}
