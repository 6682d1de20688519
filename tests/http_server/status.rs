use servicelog_relay::{
    config::DEFAULT_NAMESPACE,
    http_server::CLUSTER_RECEIVER_PATH,
    test_helpers::{AlertBuilder, NotificationBuilder, receiver_data},
};

use crate::helpers::*;

#[tokio::test]
async fn status_endpoint_returns_status_json() {
    let store = create_test_store().await;
    let server = TestServer::new(store).await;

    let resp = server.get("/status").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["namespace"], DEFAULT_NAMESPACE);
    assert!(body["uptime_secs"].as_u64().is_some());
    assert_eq!(body["service_logs_sent"], serde_json::json!({}));

    server.cleanup();
}

#[tokio::test]
async fn status_endpoint_reports_activity() {
    let server = TestServer::with_notifications(vec![
        NotificationBuilder::new("volume-filling-up").into_managed("sre-managed-notifications"),
    ])
    .await;

    server.post_raw(CLUSTER_RECEIVER_PATH, "not json").await;
    let data = receiver_data(vec![
        AlertBuilder::new("KubePersistentVolumeFillingUp").template("volume-filling-up").build(),
    ]);
    server.post_alerts(CLUSTER_RECEIVER_PATH, &data).await;
    server.post_raw(CLUSTER_RECEIVER_PATH, "still not json").await;

    let body: serde_json::Value =
        server.get("/status").await.json().await.expect("Failed to parse JSON");
    assert_eq!(body["service_logs_sent"]["volume-filling-up"]["firing"], 1);
    assert_eq!(body["service_logs_sent"]["volume-filling-up"]["resolved"], 0);
    // The successful request in between reset the failure streak.
    assert_eq!(body["request_failures"][CLUSTER_RECEIVER_PATH], 1);

    server.cleanup();
}
