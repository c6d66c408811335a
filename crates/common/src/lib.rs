//! FilingForge Common Library
//!
//! Shared code for the FilingForge binaries including:
//! - Document models and storage (PostgreSQL and in-memory)
//! - EDGAR registry client
//! - Error types and handling
//! - Configuration management
//! - Logging and metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod registry;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{Collection, DocumentStore, InMemoryStore, PgDocumentStore, StoreSession};
pub use errors::{AppError, Result};
pub use registry::{EdgarClient, Fetched, RecordFetcher};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
