//! Snapshot of the collections a report reads

use crate::pipeline::Row;
use filingforge_common::{Collection, DocumentStore, Result};
use std::collections::HashMap;
use tracing::debug;

/// Rows of each loaded collection, in storage order, keyed by collection
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    collections: HashMap<Collection, Vec<Row>>,
}

impl Dataset {
    /// Scan every source collection once
    pub async fn load<S>(store: &S, sources: &[Collection]) -> Result<Self>
    where
        S: DocumentStore + ?Sized,
    {
        let mut dataset = Self::default();
        for &collection in sources {
            let rows: Vec<Row> = store
                .scan(collection)
                .await?
                .into_iter()
                .map(|stored| stored.into_row())
                .collect();
            debug!(%collection, rows = rows.len(), "Collection loaded");
            dataset.collections.insert(collection, rows);
        }
        Ok(dataset)
    }

    pub fn with(mut self, collection: Collection, rows: Vec<Row>) -> Self {
        self.collections.insert(collection, rows);
        self
    }

    /// Rows of a collection; empty when it was not loaded
    pub fn rows(&self, collection: Collection) -> &[Row] {
        self.collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
