//! Report output sink

use crate::errors::ReportError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Write `results` as a pretty-printed JSON array, replacing any previous file.
pub fn write_report<T: Serialize>(path: &Path, results: &[T]) -> Result<(), ReportError> {
    let body = serde_json::to_string_pretty(results)?;
    std::fs::write(path, body).map_err(|source| ReportError::Output {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), "Report file written");
    Ok(())
}
