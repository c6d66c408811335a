//! Ingestion error types

use filingforge_common::db::models::Cik;
use filingforge_common::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read identifier source {path}: {source}")]
    IdentifierSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed identifier source: {0}")]
    MalformedIdentifiers(String),

    #[error("Fetch failed for CIK {cik}: {source}")]
    Fetch {
        cik: Cik,
        #[source]
        source: AppError,
    },

    #[error("Storage failed for CIK {cik}: {source}")]
    Storage {
        cik: Cik,
        #[source]
        source: AppError,
    },

    #[error("Ingestion aborted at CIK {cik} after {completed} identifiers: {source}")]
    Aborted {
        cik: Cik,
        completed: usize,
        #[source]
        source: Box<IngestionError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Setup failures from the shared layer (registry client, storage connection)
    #[error(transparent)]
    App(#[from] AppError),
}

impl IngestionError {
    /// Identifier the run stopped on, if the failure is tied to one
    pub fn cik(&self) -> Option<Cik> {
        match self {
            IngestionError::Fetch { cik, .. }
            | IngestionError::Storage { cik, .. }
            | IngestionError::Aborted { cik, .. } => Some(*cik),
            _ => None,
        }
    }

    /// Numeric code of the shared-layer error underneath, if any
    pub fn error_code(&self) -> Option<u16> {
        match self {
            IngestionError::Fetch { source, .. }
            | IngestionError::Storage { source, .. }
            | IngestionError::App(source) => Some(source.code().as_code()),
            IngestionError::Aborted { source, .. } => source.error_code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_errors_keep_their_own_message() {
        let registry: IngestionError = AppError::InvalidFormat {
            message: "registry.requests_per_second must be greater than zero".to_string(),
        }
        .into();
        assert_eq!(
            registry.to_string(),
            "Invalid format: registry.requests_per_second must be greater than zero"
        );
        assert_eq!(registry.error_code(), Some(1001));
        assert_eq!(registry.cik(), None);

        let storage: IngestionError = AppError::DatabaseConnection {
            message: "refused".to_string(),
        }
        .into();
        assert_eq!(storage.to_string(), "Database connection error: refused");
        assert_eq!(storage.error_code(), Some(7002));
    }
}
