#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use reqwest::Client;
use servicelog_relay::{
    config::AppConfig,
    context::AppMetrics,
    engine::{DispatchSettings, Dispatcher},
    http_server::{self, ApiState},
    models::{AmReceiverData, FleetNotification, ManagedFleetNotification, ManagedNotification},
    notification::TemplateService,
    persistence::{SqliteDocumentStore, traits::DocumentStore},
    test_helpers::RecordingSender,
};
use tokio::task;
use tokio_util::sync::CancellationToken;

pub const CLUSTER_ID: &str = "c1d2e3f4-0000-4000-8000-000000000001";

pub async fn create_test_store() -> Arc<SqliteDocumentStore> {
    let store = SqliteDocumentStore::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store");
    store.run_migrations().await.expect("Failed to run migrations");
    Arc::new(store)
}

pub fn create_test_server_config(address: &str) -> Arc<AppConfig> {
    Arc::new(AppConfig::builder().cluster_id(CLUSTER_ID).listen_address(address).build())
}

pub struct TestServer {
    pub address: SocketAddr,
    pub server_handle: task::JoinHandle<()>,
    pub client: Client,
    pub store: Arc<SqliteDocumentStore>,
    pub sender: RecordingSender,
    pub shutdown: CancellationToken,
}

impl TestServer {
    pub async fn new(store: Arc<SqliteDocumentStore>) -> Self {
        Self::with_sender(store, RecordingSender::new()).await
    }

    pub async fn with_sender(store: Arc<SqliteDocumentStore>, sender: RecordingSender) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get address");
        drop(listener); // Release port for the app to use

        let config = create_test_server_config(&addr.to_string());
        let metrics = AppMetrics::default();
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(sender.clone()),
            Arc::new(TemplateService::new()),
            metrics.clone(),
            DispatchSettings::from(config.as_ref()),
        );
        let shutdown = CancellationToken::new();
        let state = ApiState {
            config,
            dispatcher: Arc::new(dispatcher),
            app_metrics: metrics,
            shutdown: shutdown.clone(),
        };

        // Spawn the actual app server
        let server_handle = task::spawn(async move {
            http_server::run_server_from_config(state).await.expect("Server failed");
        });

        // Wait for server to start
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        Self { address: addr, server_handle, client: Client::new(), store, sender, shutdown }
    }

    pub async fn with_notifications(documents: Vec<ManagedNotification>) -> Self {
        let store = create_test_store().await;
        for document in &documents {
            store
                .create_document(servicelog_relay::config::DEFAULT_NAMESPACE, document)
                .await
                .expect("Failed to store notification");
        }
        Self::new(store).await
    }

    pub async fn with_fleet_notifications(templates: Vec<FleetNotification>) -> Self {
        let store = create_test_store().await;
        for template in templates {
            store
                .create_document(
                    servicelog_relay::config::DEFAULT_NAMESPACE,
                    &ManagedFleetNotification::new(template),
                )
                .await
                .expect("Failed to store fleet notification");
        }
        Self::new(store).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("Request failed")
    }

    pub async fn post_alerts(&self, path: &str, data: &AmReceiverData) -> reqwest::Response {
        self.client.post(self.url(path)).json(data).send().await.expect("Request failed")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.client.post(self.url(path)).body(body).send().await.expect("Request failed")
    }

    pub fn cleanup(self) {
        self.shutdown.cancel();
        self.server_handle.abort();
    }
}
