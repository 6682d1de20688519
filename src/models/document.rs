//! Versioned documents kept by the document store.

use serde::{Serialize, de::DeserializeOwned};

/// A value that can be stored as a named document of a fixed kind.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The kind under which documents of this type are stored.
    const KIND: &'static str;

    /// The name identifying the document within its kind and namespace.
    fn name(&self) -> &str;
}

/// A document together with the version it was read at.
///
/// Writes must present the version they read; the store rejects them with a
/// conflict when the stored version moved on in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// Version of the stored document.
    pub version: i64,
    /// The document itself.
    pub value: T,
}

impl<T> Versioned<T> {
    /// Wraps a value read at the given version.
    pub fn new(version: i64, value: T) -> Self {
        Self { version, value }
    }
}
