//! Report error types

use filingforge_common::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Storage error: {0}")]
    Storage(#[from] AppError),

    #[error("Failed to write report {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid year {input:?}: expected a whole number")]
    InvalidYear { input: String },

    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
}
