use servicelog_relay::{
    config::DEFAULT_NAMESPACE,
    http_server::FLEET_RECEIVER_PATH,
    models::ManagedFleetNotificationRecord,
    notification::ClusterRef,
    persistence::traits::DocumentStore,
    test_helpers::{AlertBuilder, FleetNotificationBuilder, receiver_data},
};

use crate::helpers::*;

const MANAGEMENT_CLUSTER: &str = "mc-1";

async fn audit_server() -> TestServer {
    TestServer::with_fleet_notifications(vec![
        FleetNotificationBuilder::new("audit-webhook-error")
            .resolved_message("The audit webhook recovered.")
            .resend_wait(1)
            .build(),
    ])
    .await
}

fn audit_alert(hosted_cluster: &str) -> AlertBuilder {
    AlertBuilder::new("AuditWebhookError")
        .template("audit-webhook-error")
        .fleet(MANAGEMENT_CLUSTER, hosted_cluster)
}

async fn stored_record(server: &TestServer) -> ManagedFleetNotificationRecord {
    server
        .store
        .get_document::<ManagedFleetNotificationRecord>(DEFAULT_NAMESPACE, MANAGEMENT_CLUSTER)
        .await
        .expect("Failed to read record")
        .expect("Record missing")
        .value
}

#[tokio::test]
async fn get_is_not_allowed() {
    let server = audit_server().await;

    let resp = server.get(FLEET_RECEIVER_PATH).await;

    assert_eq!(resp.status(), 405);

    server.cleanup();
}

#[tokio::test]
async fn hosted_clusters_are_tracked_separately() {
    let server = audit_server().await;
    let data = receiver_data(vec![audit_alert("hc-1").build(), audit_alert("hc-2").build()]);

    let resp = server.post_alerts(FLEET_RECEIVER_PATH, &data).await;
    server.post_alerts(FLEET_RECEIVER_PATH, &receiver_data(vec![audit_alert("hc-1").build()])).await;

    assert_eq!(resp.status(), 200);
    let sent = server.sender.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].cluster, ClusterRef::InternalId("hc-1".to_string()));
    assert_eq!(sent[1].cluster, ClusterRef::InternalId("hc-2".to_string()));

    let record = stored_record(&server).await;
    let by_name = record.record_by_name("audit-webhook-error").unwrap();
    assert_eq!(by_name.resend_wait, 1);
    assert_eq!(by_name.item("hc-1").unwrap().service_log_sent_count, 1);
    assert_eq!(by_name.item("hc-2").unwrap().service_log_sent_count, 1);

    server.cleanup();
}

#[tokio::test]
async fn resolved_alert_sends_resolved_message() {
    let server = audit_server().await;

    server.post_alerts(FLEET_RECEIVER_PATH, &receiver_data(vec![audit_alert("hc-1").build()])).await;
    server
        .post_alerts(FLEET_RECEIVER_PATH, &receiver_data(vec![audit_alert("hc-1").resolved().build()]))
        .await;

    let sent = server.sender.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(!sent[1].is_firing);
    assert_eq!(sent[1].resolved_description, "The audit webhook recovered.");

    server.cleanup();
}

#[tokio::test]
async fn alert_without_cluster_labels_is_skipped() {
    let server = audit_server().await;
    let data = receiver_data(vec![
        audit_alert("hc-1").without_label("_mc_id").build(),
    ]);

    let resp = server.post_alerts(FLEET_RECEIVER_PATH, &data).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(server.sender.count().await, 0);

    server.cleanup();
}
