//! This module contains the document storage used for notification templates
//! and their delivery records.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;
