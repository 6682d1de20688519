//! This module contains the storage interface shared by every backend.

use async_trait::async_trait;

use super::error::PersistenceError;
use crate::models::{Document, Versioned};

/// A store of versioned documents with optimistic concurrency.
///
/// Documents are addressed by their kind, a namespace and their name. Every
/// successful write bumps the stored version; an update presenting a version
/// other than the stored one fails with [`PersistenceError::Conflict`] and
/// leaves the document untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document, or `None` when it does not exist.
    async fn get_document<D: Document>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Versioned<D>>, PersistenceError>;

    /// Retrieves every document of a kind in a namespace, ordered by name.
    async fn list_documents<D: Document>(
        &self,
        namespace: &str,
    ) -> Result<Vec<Versioned<D>>, PersistenceError>;

    /// Stores a new document at version 1.
    ///
    /// Fails with [`PersistenceError::AlreadyExists`] when a document of the
    /// same kind and name is already stored.
    async fn create_document<D: Document>(
        &self,
        namespace: &str,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError>;

    /// Replaces a document if it is still at `expected_version`.
    ///
    /// Fails with [`PersistenceError::Conflict`] on a stale version and with
    /// [`PersistenceError::NotFound`] when the document does not exist.
    async fn update_document<D: Document>(
        &self,
        namespace: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError>;

    /// Ensures all pending writes are flushed to durable storage.
    async fn flush(&self) -> Result<(), PersistenceError> {
        Ok(())
    }

    /// Performs any necessary cleanup operations before shutdown.
    async fn cleanup(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
