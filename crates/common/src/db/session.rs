//! Scoped ownership of a store handle for one pipeline invocation

use super::DocumentStore;
use crate::errors::Result;
use std::ops::Deref;
use tracing::{debug, warn};

/// Owns a store handle for the lifetime of one pipeline invocation.
///
/// Drivers finish with [`StoreSession::release_with`] so the handle is closed
/// on success and failure alike. A session dropped without being closed
/// still drops the handle, which returns its pooled connections.
pub struct StoreSession<S: DocumentStore> {
    store: S,
    closed: bool,
}

impl<S: DocumentStore> StoreSession<S> {
    pub fn open(store: S) -> Self {
        debug!("Storage session opened");
        Self { store, closed: false }
    }

    /// Close the handle explicitly
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        self.store.close().await?;
        debug!("Storage session closed");
        Ok(())
    }

    /// Close the handle, then hand back the pipeline's own result.
    ///
    /// A failure to close is logged; it never masks the pipeline result.
    pub async fn release_with<T, E>(self, result: std::result::Result<T, E>) -> std::result::Result<T, E> {
        if let Err(e) = self.close().await {
            warn!(error = %e, "Failed to release storage handle");
        }
        result
    }
}

impl<S: DocumentStore> Deref for StoreSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.store
    }
}

impl<S: DocumentStore> Drop for StoreSession<S> {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Storage session dropped without close; releasing handle");
        }
    }
}
