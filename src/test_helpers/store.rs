//! A `DocumentStore` wrapper that injects write failures.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use crate::{
    models::{Document, Versioned},
    persistence::{error::PersistenceError, traits::DocumentStore},
};

/// Delegates to an inner store and fails updates on demand.
///
/// Injected conflicts behave like a concurrent writer: the inner document is
/// left untouched and the caller is expected to re-read it.
pub struct FaultyStore<S: DocumentStore> {
    inner: S,
    pending_conflicts: AtomicU32,
    fail_updates: AtomicBool,
    update_calls: AtomicU32,
}

impl<S: DocumentStore> FaultyStore<S> {
    /// Wraps `inner` without injecting any failure.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending_conflicts: AtomicU32::new(0),
            fail_updates: AtomicBool::new(false),
            update_calls: AtomicU32::new(0),
        }
    }

    /// Makes the next `count` updates fail with a conflict.
    pub fn conflict_next_updates(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Makes every update fail with an operation error while `fail` is set.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of updates attempted, failed ones included.
    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    async fn get_document<D: Document>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Versioned<D>>, PersistenceError> {
        self.inner.get_document(namespace, name).await
    }

    async fn list_documents<D: Document>(
        &self,
        namespace: &str,
    ) -> Result<Vec<Versioned<D>>, PersistenceError> {
        self.inner.list_documents(namespace).await
    }

    async fn create_document<D: Document>(
        &self,
        namespace: &str,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError> {
        self.inner.create_document(namespace, document).await
    }

    async fn update_document<D: Document>(
        &self,
        namespace: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(PersistenceError::OperationFailed("injected failure".to_string()));
        }
        let conflict = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(PersistenceError::Conflict(format!("injected conflict on {}", document.name())));
        }

        self.inner.update_document(namespace, expected_version, document).await
    }
}
