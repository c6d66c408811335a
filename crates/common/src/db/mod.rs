//! Storage layer for FilingForge
//!
//! Provides:
//! - Document models for registry records
//! - The `DocumentStore` abstraction over the three collections
//! - A PostgreSQL/JSONB store and an in-memory store
//! - Session guard that scopes a store handle to one pipeline invocation

pub mod models;
mod memory;
mod postgres;
mod session;

pub use memory::InMemoryStore;
pub use postgres::PgDocumentStore;
pub use session::StoreSession;

use crate::errors::Result;
use async_trait::async_trait;
use models::{Document, DocumentId, StoredDocument};
use std::fmt;

/// The addressable collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Company profile facts, one document per ingested entity
    Companies,
    /// Filing histories, each referencing a company profile
    Filings,
    /// Pre-populated XBRL company facts; read-only here
    Accounting,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Companies, Collection::Filings, Collection::Accounting];

    /// Backing table name
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Companies => "company_data",
            Collection::Filings => "filings_data",
            Collection::Accounting => "accounting_data",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Trait for document persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document; the store generates and returns its key
    async fn insert(&self, collection: Collection, document: Document) -> Result<DocumentId>;

    /// All documents of a collection in storage-native (insertion) order
    async fn scan(&self, collection: Collection) -> Result<Vec<StoredDocument>>;

    /// Release the underlying handle
    async fn close(&self) -> Result<()>;
}
