//! Errors of the document stores.

use thiserror::Error;

/// Why a document store call failed.
///
/// `Conflict` is the only variant callers are expected to recover from, by
/// re-reading the document and re-applying their change.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The backend could not run the statement.
    #[error("Document store failure: {0}")]
    OperationFailed(String),

    /// No document with that kind, namespace and name.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The stored version moved past the one the write was based on.
    #[error("Stale write rejected: {0}")]
    Conflict(String),

    /// A stored value is not valid JSON for its kind, or a value could not be
    /// encoded.
    #[error("Invalid document encoding: {0}")]
    SerializationError(String),

    /// Applying the bundled migrations failed.
    #[error("Schema migration failed: {0}")]
    MigrationError(String),

    /// The database URL could not be parsed.
    #[error("Invalid store settings: {0}")]
    InvalidInput(String),

    /// A create hit a document that is already stored.
    #[error("Document already exists: {0}")]
    AlreadyExists(String),
}

impl PersistenceError {
    /// Returns `true` for a rejected stale write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PersistenceError::Conflict(_))
    }
}
