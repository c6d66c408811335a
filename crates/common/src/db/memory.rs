//! In-memory document store for tests and dry runs

use super::models::{Document, DocumentId, StoredDocument};
use super::{Collection, DocumentStore};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<Collection, Vec<StoredDocument>>,
    insert_attempts: usize,
    fail_inserts_into: Option<Collection>,
    closed: bool,
}

/// Document store that keeps everything in process memory.
///
/// Clones share state, so a test can hand one clone to a pipeline and
/// inspect the other afterwards.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a document directly, bypassing insert accounting
    pub fn seed(&self, collection: Collection, document: Document) -> DocumentId {
        let id = Uuid::new_v4();
        self.state()
            .collections
            .entry(collection)
            .or_default()
            .push(StoredDocument { id, document });
        id
    }

    /// Make every insert into `collection` fail with a database error
    pub fn fail_inserts_into(&self, collection: Collection) {
        self.state().fail_inserts_into = Some(collection);
    }

    pub fn documents(&self, collection: Collection) -> Vec<StoredDocument> {
        self.state()
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.state()
            .collections
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of insert calls, including failed ones
    pub fn insert_attempts(&self) -> usize {
        self.state().insert_attempts
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Reopen after `close`, as a fresh connection would
    pub fn reopen(&self) {
        self.state().closed = false;
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<DocumentId> {
        let mut state = self.state();
        if state.closed {
            return Err(AppError::DatabaseConnection {
                message: "store is closed".to_string(),
            });
        }

        state.insert_attempts += 1;
        if state.fail_inserts_into == Some(collection) {
            return Err(AppError::Database(sea_orm::DbErr::Custom(format!(
                "insert into {} rejected",
                collection
            ))));
        }

        let id = Uuid::new_v4();
        state
            .collections
            .entry(collection)
            .or_default()
            .push(StoredDocument { id, document });
        Ok(id)
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let state = self.state();
        if state.closed {
            return Err(AppError::DatabaseConnection {
                message: "store is closed".to_string(),
            });
        }
        Ok(state.collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        self.state().closed = true;
        Ok(())
    }
}
