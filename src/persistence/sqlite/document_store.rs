//! Implementation of the DocumentStore trait for SqliteDocumentStore

use async_trait::async_trait;

use crate::{
    models::{Document, Versioned},
    persistence::{
        error::PersistenceError,
        sqlite::{SqliteDocumentStore, database_error},
        traits::DocumentStore,
    },
};

// Helper struct for mapping from the database row
#[derive(sqlx::FromRow)]
struct DocumentRow {
    name: String,
    version: i64,
    value: String,
}

impl DocumentRow {
    fn decode<D: Document>(self) -> Result<Versioned<D>, PersistenceError> {
        match serde_json::from_str(&self.value) {
            Ok(value) => Ok(Versioned::new(self.version, value)),
            Err(e) => {
                tracing::error!(kind = D::KIND, name = %self.name, error = %e, "Failed to decode stored document.");
                Err(PersistenceError::SerializationError(e.to_string()))
            }
        }
    }
}

fn encode<D: Document>(document: &D) -> Result<String, PersistenceError> {
    serde_json::to_string(document).map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn describe<D: Document>(namespace: &str, name: &str) -> String {
    format!("{} '{}/{}'", D::KIND, namespace, name)
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    #[tracing::instrument(skip(self), fields(kind = D::KIND), level = "debug")]
    async fn get_document<D: Document>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Versioned<D>>, PersistenceError> {
        tracing::debug!(namespace, name, "Querying for document.");

        let row = self
            .query_result(
                "get document",
                sqlx::query_as::<_, DocumentRow>(
                    "SELECT name, version, value FROM documents WHERE kind = ? AND namespace = ? AND name = ?",
                )
                .bind(D::KIND)
                .bind(namespace)
                .bind(name)
                .fetch_optional(&self.pool),
            )
            .await?;

        row.map(DocumentRow::decode).transpose()
    }

    #[tracing::instrument(skip(self), fields(kind = D::KIND), level = "debug")]
    async fn list_documents<D: Document>(
        &self,
        namespace: &str,
    ) -> Result<Vec<Versioned<D>>, PersistenceError> {
        tracing::debug!(namespace, "Listing documents.");

        let rows = self
            .query_result(
                "list documents",
                sqlx::query_as::<_, DocumentRow>(
                    "SELECT name, version, value FROM documents WHERE kind = ? AND namespace = ? ORDER BY name",
                )
                .bind(D::KIND)
                .bind(namespace)
                .fetch_all(&self.pool),
            )
            .await?;

        rows.into_iter().map(DocumentRow::decode).collect()
    }

    #[tracing::instrument(skip(self, document), fields(kind = D::KIND, name = document.name()), level = "debug")]
    async fn create_document<D: Document>(
        &self,
        namespace: &str,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError> {
        let value = encode(document)?;

        let result = sqlx::query(
            "INSERT INTO documents (kind, namespace, name, version, value) VALUES (?, ?, ?, 1, ?)",
        )
        .bind(D::KIND)
        .bind(namespace)
        .bind(document.name())
        .bind(value)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(namespace, "Document created.");
                Ok(Versioned::new(1, document.clone()))
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() =>
                Err(PersistenceError::AlreadyExists(describe::<D>(namespace, document.name()))),
            Err(e) => Err(database_error("create document", e)),
        }
    }

    #[tracing::instrument(skip(self, document), fields(kind = D::KIND, name = document.name()), level = "debug")]
    async fn update_document<D: Document>(
        &self,
        namespace: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<Versioned<D>, PersistenceError> {
        let value = encode(document)?;

        let result = self
            .query_result(
                "update document",
                sqlx::query(
                    r#"
                UPDATE documents
                SET value = ?, version = version + 1, updated_at = CURRENT_TIMESTAMP
                WHERE kind = ? AND namespace = ? AND name = ? AND version = ?
                "#,
                )
                .bind(value)
                .bind(D::KIND)
                .bind(namespace)
                .bind(document.name())
                .bind(expected_version)
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 1 {
            tracing::debug!(namespace, version = expected_version + 1, "Document updated.");
            return Ok(Versioned::new(expected_version + 1, document.clone()));
        }

        // Nothing matched: tell a stale version apart from a missing row.
        let current: Option<(i64,)> = self
            .query_result(
                "check document version",
                sqlx::query_as(
                    "SELECT version FROM documents WHERE kind = ? AND namespace = ? AND name = ?",
                )
                .bind(D::KIND)
                .bind(namespace)
                .bind(document.name())
                .fetch_optional(&self.pool),
            )
            .await?;

        match current {
            Some((version,)) => {
                tracing::debug!(namespace, version, expected_version, "Rejected stale document update.");
                Err(PersistenceError::Conflict(format!(
                    "{} is at version {}, expected {}",
                    describe::<D>(namespace, document.name()),
                    version,
                    expected_version
                )))
            }
            None => Err(PersistenceError::NotFound(describe::<D>(namespace, document.name()))),
        }
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn flush(&self) -> Result<(), PersistenceError> {
        tracing::debug!("Flushing pending writes to disk.");
        self.query_result(
            "checkpoint write-ahead log",
            sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)").execute(&self.pool),
        )
        .await?;
        tracing::debug!("Pending writes flushed successfully.");
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "info")]
    async fn cleanup(&self) -> Result<(), PersistenceError> {
        self.flush().await?;
        tracing::debug!("Closing SQLite connection pool.");
        self.pool.close().await;
        tracing::info!("SQLite connection pool closed successfully.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ManagedFleetNotificationRecord, ManagedNotification, Notification, NotificationRecord,
    };

    const NAMESPACE: &str = "openshift-ocm-agent-operator";

    async fn setup_test_db() -> SqliteDocumentStore {
        let store = SqliteDocumentStore::new("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory db");
        store.run_migrations().await.expect("Failed to run migrations");
        store
    }

    fn managed_notification(name: &str) -> ManagedNotification {
        ManagedNotification::new(
            name,
            vec![Notification {
                name: "volume-filling-up".to_string(),
                summary: "PersistentVolume filling up".to_string(),
                active_body: "A volume is filling up.".to_string(),
                severity: "Warning".to_string(),
                resend_wait: 24,
                ..Default::default()
            }],
        )
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let store = setup_test_db().await;
        let fetched =
            store.get_document::<ManagedNotification>(NAMESPACE, "missing").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_create_get_and_update() {
        let store = setup_test_db().await;
        let mut mn = managed_notification("sre-managed-notifications");

        let created = store.create_document(NAMESPACE, &mn).await.unwrap();
        assert_eq!(created.version, 1);

        mn.status.notification_records.push(NotificationRecord::new("volume-filling-up"));
        let updated = store.update_document(NAMESPACE, created.version, &mn).await.unwrap();
        assert_eq!(updated.version, 2);

        let fetched = store
            .get_document::<ManagedNotification>(NAMESPACE, "sre-managed-notifications")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.version, 2);
        assert_eq!(fetched.value, mn);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_already_exists() {
        let store = setup_test_db().await;
        let record = ManagedFleetNotificationRecord::new("mc-1");
        store.create_document(NAMESPACE, &record).await.unwrap();

        let result = store.create_document(NAMESPACE, &record).await;
        assert!(matches!(result, Err(PersistenceError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_stale_update_is_conflict_and_leaves_row_untouched() {
        let store = setup_test_db().await;
        let record = ManagedFleetNotificationRecord::new("mc-1");
        store.create_document(NAMESPACE, &record).await.unwrap();

        let mut first = record.clone();
        first.status.management_cluster = "first".to_string();
        store.update_document(NAMESPACE, 1, &first).await.unwrap();

        let mut second = record.clone();
        second.status.management_cluster = "second".to_string();
        let result = store.update_document(NAMESPACE, 1, &second).await;
        assert!(result.unwrap_err().is_conflict());

        let stored = store
            .get_document::<ManagedFleetNotificationRecord>(NAMESPACE, "mc-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.value.status.management_cluster, "first");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = setup_test_db().await;
        let record = ManagedFleetNotificationRecord::new("mc-404");
        let result = store.update_document(NAMESPACE, 1, &record).await;
        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_kinds_do_not_collide() {
        let store = setup_test_db().await;
        store.create_document(NAMESPACE, &managed_notification("shared-name")).await.unwrap();
        store
            .create_document(NAMESPACE, &ManagedFleetNotificationRecord::new("shared-name"))
            .await
            .unwrap();

        let listed = store.list_documents::<ManagedNotification>(NAMESPACE).await.unwrap();
        assert_eq!(listed.len(), 1);
        let other = store.list_documents::<ManagedNotification>("other-namespace").await.unwrap();
        assert!(other.is_empty());
    }
}
