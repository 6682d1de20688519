//! Integration tests for the persistence layer

use std::sync::Arc;

use chrono::Utc;
use servicelog_relay::{
    models::{Ledger, ManagedFleetNotificationRecord, ManagedNotification},
    persistence::{
        InMemoryDocumentStore, SqliteDocumentStore, error::PersistenceError,
        traits::DocumentStore,
    },
    test_helpers::NotificationBuilder,
};
use tempfile::TempDir;

const NAMESPACE: &str = "openshift-ocm-agent-operator";

async fn setup_db(url: &str) -> SqliteDocumentStore {
    let store = SqliteDocumentStore::new(url).await.expect("Failed to set up database");
    store.run_migrations().await.expect("Failed to run migrations");
    store
}

fn file_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("relay.db").display())
}

/// Exercises the optimistic concurrency contract every backend shares.
async fn assert_versioning_contract<S: DocumentStore>(store: &S) {
    let document = NotificationBuilder::new("volume-filling-up").into_managed("sre");

    let created = store.create_document(NAMESPACE, &document).await.unwrap();
    assert_eq!(created.version, 1);
    assert!(matches!(
        store.create_document(NAMESPACE, &document).await,
        Err(PersistenceError::AlreadyExists(_))
    ));

    let mut changed = created.value.clone();
    changed.spec.notifications[0].resend_wait = 48;
    let updated = store.update_document(NAMESPACE, 1, &changed).await.unwrap();
    assert_eq!(updated.version, 2);

    let stale = store.update_document(NAMESPACE, 1, &document).await;
    assert!(stale.unwrap_err().is_conflict());

    let fetched =
        store.get_document::<ManagedNotification>(NAMESPACE, "sre").await.unwrap().unwrap();
    assert_eq!(fetched.version, 2);
    assert_eq!(fetched.value.spec.notifications[0].resend_wait, 48);

    let missing = ManagedFleetNotificationRecord::new("mc-404");
    assert!(matches!(
        store.update_document(NAMESPACE, 1, &missing).await,
        Err(PersistenceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_in_memory_store_versioning() {
    assert_versioning_contract(&InMemoryDocumentStore::new()).await;
}

#[tokio::test]
async fn test_sqlite_store_versioning() {
    assert_versioning_contract(&setup_db("sqlite::memory:").await).await;
}

#[tokio::test]
async fn test_list_is_ordered_by_name() {
    let store = setup_db("sqlite::memory:").await;
    for name in ["zeta", "alpha", "mid"] {
        store
            .create_document(NAMESPACE, &NotificationBuilder::new("t").into_managed(name))
            .await
            .unwrap();
    }

    let names: Vec<_> = store
        .list_documents::<ManagedNotification>(NAMESPACE)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.value.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn test_records_survive_restart() {
    let dir = TempDir::new().unwrap();
    let store = setup_db(&file_url(&dir)).await;
    let mut record = ManagedFleetNotificationRecord::new("mc-1");
    record.initialize_status();
    store.create_document(NAMESPACE, &record).await.unwrap();
    store.flush().await.unwrap();
    store.cleanup().await.unwrap();

    let reopened = setup_db(&file_url(&dir)).await;
    let fetched = reopened
        .get_document::<ManagedFleetNotificationRecord>(NAMESPACE, "mc-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.version, 1);
    assert!(fetched.value.has_status());
}

#[tokio::test]
async fn test_concurrent_updates_have_one_winner() {
    let dir = TempDir::new().unwrap();
    let first = Arc::new(setup_db(&file_url(&dir)).await);
    let second = Arc::new(setup_db(&file_url(&dir)).await);
    let mut record = ManagedFleetNotificationRecord::new("mc-1");
    record.initialize_status();
    first.create_document(NAMESPACE, &record).await.unwrap();

    let writes = [first, second].map(|store| {
        let mut value = record.clone();
        tokio::spawn(async move {
            value.status.notification_record_by_name.push(Default::default());
            value.status.notification_record_by_name[0]
                .item_or_insert("hc-1")
                .record_send(true, Utc::now());
            store.update_document(NAMESPACE, 1, &value).await
        })
    });

    let mut won = 0;
    let mut conflicted = 0;
    for write in writes {
        match write.await.unwrap() {
            Ok(updated) => {
                assert_eq!(updated.version, 2);
                won += 1;
            }
            Err(e) if e.is_conflict() => conflicted += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((won, conflicted), (1, 1));
}
