//! An in-memory `DocumentStore`, used for ephemeral runs and tests.

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use super::{error::PersistenceError, traits::DocumentStore};
use crate::models::{Document, Versioned};

type DocumentKey = (String, String, String);

/// A stored document: its version and its JSON encoding.
#[derive(Debug, Clone)]
struct StoredDocument {
    version: i64,
    value: String,
}

/// Keeps documents in a concurrent map. Version checks happen under the
/// map's shard lock, so concurrent updates of one document are serialized.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<DocumentKey, StoredDocument>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all kinds.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn key<D: Document>(namespace: &str, name: &str) -> DocumentKey {
        (D::KIND.to_string(), namespace.to_string(), name.to_string())
    }

    fn decode<D: Document>(stored: &StoredDocument) -> Result<Versioned<D>, PersistenceError> {
        serde_json::from_str(&stored.value)
            .map(|value| Versioned::new(stored.version, value))
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))
    }

    fn encode<D: Document>(document: &D) -> Result<String, PersistenceError> {
        serde_json::to_string(document).map_err(|e| PersistenceError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document<D: Document>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Versioned<D>>, PersistenceError> {
        match self.documents.get(&Self::key::<D>(namespace, name)) {
            Some(stored) => Self::decode(stored.value()).map(Some),
            None => Ok(None),
        }
    }

    async fn list_documents<D: Document>(
        &self,
        namespace: &str,
    ) -> Result<Vec<Versioned<D>>, PersistenceError> {
        let mut matching: Vec<(String, StoredDocument)> = self
            .documents
            .iter()
            .filter(|e| e.key().0 == D::KIND && e.key().1 == namespace)
            .map(|e| (e.key().2.clone(), e.value().clone()))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));
        matching.iter().map(|(_, stored)| Self::decode(stored)).collect()
    }

    async fn create_document<D: Document>(
        &self,
        namespace: &str,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError> {
        let value = Self::encode(document)?;
        match self.documents.entry(Self::key::<D>(namespace, document.name())) {
            Entry::Occupied(_) => Err(PersistenceError::AlreadyExists(format!(
                "{} '{}/{}'",
                D::KIND,
                namespace,
                document.name()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(StoredDocument { version: 1, value });
                Ok(Versioned::new(1, document.clone()))
            }
        }
    }

    async fn update_document<D: Document>(
        &self,
        namespace: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError> {
        let value = Self::encode(document)?;
        let Some(mut stored) = self.documents.get_mut(&Self::key::<D>(namespace, document.name()))
        else {
            return Err(PersistenceError::NotFound(format!(
                "{} '{}/{}'",
                D::KIND,
                namespace,
                document.name()
            )));
        };

        if stored.version != expected_version {
            return Err(PersistenceError::Conflict(format!(
                "{} '{}/{}' is at version {}, expected {}",
                D::KIND,
                namespace,
                document.name(),
                stored.version,
                expected_version
            )));
        }

        stored.version += 1;
        stored.value = value;
        Ok(Versioned::new(stored.version, document.clone()))
    }
}
