use servicelog_relay::{
    config::DEFAULT_NAMESPACE,
    http_server::CLUSTER_RECEIVER_PATH,
    models::ManagedNotification,
    notification::ClusterRef,
    persistence::traits::DocumentStore,
    test_helpers::{AlertBuilder, NotificationBuilder, receiver_data},
};

use crate::helpers::*;

const DOCUMENT: &str = "sre-managed-notifications";

async fn volume_server() -> TestServer {
    TestServer::with_notifications(vec![
        NotificationBuilder::new("volume-filling-up")
            .summary("Volume {{ labels.persistentvolumeclaim }} filling up")
            .active_body("The volume is filling up.")
            .resolved_body("The volume has space again.")
            .resend_wait(24)
            .into_managed(DOCUMENT),
    ])
    .await
}

fn volume_alert() -> AlertBuilder {
    AlertBuilder::new("KubePersistentVolumeFillingUp")
        .template("volume-filling-up")
        .label("persistentvolumeclaim", "prometheus-data")
}

async fn stored(server: &TestServer) -> ManagedNotification {
    server
        .store
        .get_document::<ManagedNotification>(DEFAULT_NAMESPACE, DOCUMENT)
        .await
        .expect("Failed to read document")
        .expect("Document missing")
        .value
}

#[tokio::test]
async fn get_is_not_allowed() {
    let server = volume_server().await;

    let resp = server.get(CLUSTER_RECEIVER_PATH).await;

    assert_eq!(resp.status(), 405);
    assert_eq!(resp.text().await.unwrap(), "Method Not Allowed\n");

    server.cleanup();
}

#[tokio::test]
async fn undecodable_body_is_rejected() {
    let server = volume_server().await;

    let resp = server.post_raw(CLUSTER_RECEIVER_PATH, "{\"alerts\": 5").await;

    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Bad request body\n");
    assert_eq!(server.sender.count().await, 0);

    server.cleanup();
}

#[tokio::test]
async fn firing_alert_is_sent_once_within_resend_wait() {
    let server = volume_server().await;
    let data = receiver_data(vec![volume_alert().build()]);

    let first = server.post_alerts(CLUSTER_RECEIVER_PATH, &data).await;
    let second = server.post_alerts(CLUSTER_RECEIVER_PATH, &data).await;

    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let sent = server.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].summary, "Volume prometheus-data filling up");
    assert_eq!(sent[0].cluster, ClusterRef::ExternalId(CLUSTER_ID.to_string()));
    assert!(sent[0].is_firing);

    let record = stored(&server).await;
    assert_eq!(record.record("volume-filling-up").unwrap().service_log_sent_count, 1);

    server.cleanup();
}

#[tokio::test]
async fn resolved_alert_follows_firing_one() {
    let server = volume_server().await;

    server.post_alerts(CLUSTER_RECEIVER_PATH, &receiver_data(vec![volume_alert().build()])).await;
    let resp = server
        .post_alerts(CLUSTER_RECEIVER_PATH, &receiver_data(vec![volume_alert().resolved().build()]))
        .await;

    assert_eq!(resp.status(), 200);
    let sent = server.sender.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(!sent[1].is_firing);
    assert_eq!(sent[1].resolved_description, "The volume has space again.");
    assert_eq!(stored(&server).await.record("volume-filling-up").unwrap().service_log_sent_count, 2);

    server.cleanup();
}

#[tokio::test]
async fn invalid_alerts_do_not_fail_the_request() {
    let server = volume_server().await;
    let data = receiver_data(vec![
        volume_alert().label("send_managed_notification", "false").build(),
        AlertBuilder::new("Unknown").template("does-not-exist").build(),
        AlertBuilder::new("NoTemplate").build(),
    ]);

    let resp = server.post_alerts(CLUSTER_RECEIVER_PATH, &data).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(server.sender.count().await, 0);
    assert!(stored(&server).await.record("volume-filling-up").is_none());

    server.cleanup();
}

#[tokio::test]
async fn failed_send_is_not_recorded() {
    let server = volume_server().await;
    server.sender.respond_with(500);

    let resp =
        server.post_alerts(CLUSTER_RECEIVER_PATH, &receiver_data(vec![volume_alert().build()])).await;
    assert_eq!(resp.status(), 200);
    assert!(stored(&server).await.record("volume-filling-up").is_none());

    // The next webhook retries because nothing was recorded.
    server.sender.respond_with(201);
    server.post_alerts(CLUSTER_RECEIVER_PATH, &receiver_data(vec![volume_alert().build()])).await;
    assert_eq!(stored(&server).await.record("volume-filling-up").unwrap().service_log_sent_count, 1);

    server.cleanup();
}
