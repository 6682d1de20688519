//! Application context and initialization logic.
//! This module handles loading configuration, setting up the database,
//! storing the notification definitions and preparing the service log client.
//! The `AppContext` struct encapsulates all these components for use
//! throughout the application.

mod error;
mod metrics;

use std::sync::Arc;

pub use error::{AppContextError, InitializationError};
pub use metrics::{AppMetrics, Metrics, SERVICE_LOGS_API, SentCounts};

use crate::{
    config::AppConfig,
    http_client::HttpClientPool,
    initialization::InitializationService,
    notification::{OcmClient, ServiceLogSender, TemplateService},
    persistence::{SqliteDocumentStore, traits::DocumentStore},
};

/// The application context, holding configuration, the document store and
/// the service log client.
pub struct AppContext<S: DocumentStore> {
    /// Shared application configuration.
    pub config: AppConfig,

    /// The document store holding definitions and delivery records.
    pub store: Arc<S>,

    /// The client service logs are sent through.
    pub sender: Arc<dyn ServiceLogSender>,

    /// Template service for rendering service log texts.
    pub template_service: Arc<TemplateService>,

    /// Metrics shared by the receivers and the status endpoint.
    pub metrics: AppMetrics,
}

/// A builder for the `AppContext`, allowing configuration overrides
/// and step-by-step initialization.
pub struct AppContextBuilder {
    /// Optional configuration directory to load settings from.
    config_dir: Option<String>,

    /// Optional override for the database URL.
    database_url_override: Option<String>,
}

impl AppContextBuilder {
    /// Creates a new `AppContextBuilder` with an optional configuration
    /// directory.
    pub fn new(config_dir: Option<String>) -> Self {
        Self { config_dir, database_url_override: None }
    }

    /// Sets a database URL override.
    pub fn database_url(mut self, url: String) -> Self {
        self.database_url_override = Some(url);
        self
    }

    /// Builds the `AppContext`, performing all initialization steps.
    /// This includes loading configuration, setting up the database,
    /// storing the definition files and creating the service log client.
    pub async fn build(self) -> Result<AppContext<SqliteDocumentStore>, AppContextError> {
        tracing::debug!("Loading application configuration...");
        let mut config = AppConfig::new(self.config_dir.as_deref())?;
        tracing::debug!(database_url = %config.database_url, namespace = %config.namespace, "Configuration loaded.");

        if let Some(db_url) = self.database_url_override {
            tracing::info!(
                database_url = %db_url,
                "Overriding database URL."
            );
            config.database_url = db_url;
        }
        config.validate()?;

        tracing::debug!("Initializing document store...");
        let store = Arc::new(SqliteDocumentStore::new(&config.database_url).await?);
        store.run_migrations().await?;
        tracing::info!("Database migrations completed.");

        InitializationService::new(config.clone(), Arc::clone(&store)).run().await?;

        let sender = Self::create_sender(&config).await?;

        Ok(AppContext {
            config,
            store,
            sender,
            template_service: Arc::new(TemplateService::new()),
            metrics: AppMetrics::default(),
        })
    }

    /// Creates the OCM client on top of a pooled, retrying HTTP client.
    async fn create_sender(config: &AppConfig) -> Result<Arc<dyn ServiceLogSender>, AppContextError> {
        let pool = HttpClientPool::new(config.http_base_config.clone());
        let http_client = pool.get_or_create(&config.http_retry_config).await?;
        let client = OcmClient::new(&config.ocm, http_client)?;
        tracing::info!(endpoint = %client.endpoint(), retry_policy = ?config.http_retry_config, "Service log client initialized.");
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::{config::AppConfigError, models::ManagedNotification};

    #[test]
    fn test_app_context_builder_with_database_override() {
        let builder = AppContextBuilder::new(None).database_url("sqlite::memory:".to_string());

        assert!(builder.config_dir.is_none());
        assert_eq!(builder.database_url_override, Some("sqlite::memory:".to_string()));
    }

    #[test]
    fn test_app_context_error_display() {
        let config_error =
            AppContextError::Config(config::ConfigError::Message("test error".to_string()));
        let error_string = format!("{}", config_error);
        assert!(error_string.contains("Config error: test error"));
    }

    #[tokio::test]
    async fn test_build_loads_definitions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.yaml"), "database_url: \"sqlite::memory:\"\ncluster_id: \"cluster-uuid\"\n")
            .unwrap();
        fs::write(
            dir.path().join("notifications.yaml"),
            r#"
managed_notifications:
  - name: sre-managed-notifications
    spec:
      notifications:
        - name: volume-filling-up
          summary: "PersistentVolume filling up"
          active_body: "A volume is filling up."
          severity: Warning
"#,
        )
        .unwrap();

        let context =
            AppContextBuilder::new(Some(dir.path().to_str().unwrap().to_string())).build().await.unwrap();

        let stored: Vec<_> = context
            .store
            .list_documents::<ManagedNotification>(&context.config.namespace)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_build_rejects_missing_cluster_id() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.yaml"), "database_url: \"sqlite::memory:\"\n").unwrap();

        let result = AppContextBuilder::new(Some(dir.path().to_str().unwrap().to_string())).build().await;

        assert!(matches!(result, Err(AppContextError::InvalidConfig(AppConfigError::MissingClusterId))));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_ocm_url() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("app.yaml"),
            "database_url: \"sqlite::memory:\"\ncluster_id: \"cluster-uuid\"\nocm:\n  base_url: \"not a url\"\n",
        )
        .unwrap();

        let result = AppContextBuilder::new(Some(dir.path().to_str().unwrap().to_string())).build().await;

        assert!(matches!(result, Err(AppContextError::Notification(_))));
    }
}
