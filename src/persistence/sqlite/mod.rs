//! SQLite backend of the `DocumentStore`.

use std::{future::Future, str::FromStr};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};

mod document_store;

use crate::persistence::error::PersistenceError;

/// A `DocumentStore` backed by a SQLite database. Each document is one row of
/// the `documents` table; its `version` column is the optimistic lock.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Opens the database at `database_url`, creating the file when needed.
    /// The schema is applied separately by [`Self::run_migrations`].
    #[tracing::instrument(level = "info")]
    pub async fn new(database_url: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| PersistenceError::InvalidInput(format!("{database_url}: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| database_error("connect", e))?;
        tracing::info!(database_url, "Opened document database.");
        Ok(Self { pool })
    }

    /// Brings the schema up to date. Safe to call on every start.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_migrations(&self) -> Result<(), PersistenceError> {
        if let Err(e) = sqlx::migrate!("./migrations").run(&self.pool).await {
            tracing::error!(error = %e, "Schema migration failed.");
            return Err(PersistenceError::MigrationError(e.to_string()));
        }
        tracing::info!("Document schema is up to date.");
        Ok(())
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Awaits a statement and maps a failure to `OperationFailed`.
    async fn query_result<T>(
        &self,
        operation: &'static str,
        statement: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, PersistenceError> {
        statement.await.map_err(|e| database_error(operation, e))
    }
}

fn database_error(operation: &'static str, error: sqlx::Error) -> PersistenceError {
    tracing::error!(error = %error, operation, "Database operation failed.");
    PersistenceError::OperationFailed(format!("{operation}: {error}"))
}
