use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use super::{BaseHttpClientConfig, HttpRetryConfig, OcmConfig, ServerConfig, duration_secs};

/// Namespace the notification documents live in unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "openshift-ocm-agent-operator";

/// Provides the default value for namespace.
fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Provides the default value for conflict_retries.
fn default_conflict_retries() -> u32 {
    5
}

/// Provides the default value for shutdown_timeout.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// A loaded configuration the relay cannot run with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppConfigError {
    /// Single-cluster service logs would be posted without a target.
    #[error("cluster_id is not set; it must hold the external id of the cluster")]
    MissingClusterId,
}

/// Application configuration of the relay.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Database URL for the SQLite database.
    pub database_url: String,

    /// Namespace the notification documents are kept in.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// External id of the cluster single-cluster service logs are sent for.
    #[serde(default)]
    pub cluster_id: String,

    /// Path to the single-cluster notification definitions.
    #[serde(skip_deserializing)]
    pub notification_config_path: PathBuf,

    /// Path to the fleet notification definitions.
    #[serde(skip_deserializing)]
    pub fleet_notification_config_path: PathBuf,

    /// Service log API settings.
    #[serde(default)]
    pub ocm: OcmConfig,

    /// Configuration for HTTP client retry policies.
    #[serde(default)]
    pub http_retry_config: HttpRetryConfig,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,

    /// How often a record write is re-applied after a concurrent
    /// modification before giving up.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,

    /// The maximum time in seconds to wait for graceful shutdown.
    #[serde(
        rename = "shutdown_timeout_secs",
        with = "duration_secs",
        default = "default_shutdown_timeout"
    )]
    pub shutdown_timeout: Duration,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, with `RELAY__` prefixed environment variables taking
    /// precedence.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("RELAY").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        // Definition files are resolved relative to the config directory.
        let config_path = Path::new(config_dir_str);
        config.notification_config_path = config_path.join("notifications.yaml");
        config.fleet_notification_config_path = config_path.join("fleet_notifications.yaml");

        Ok(config)
    }

    /// Rejects settings that only fail once the first alert arrives.
    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.cluster_id.trim().is_empty() {
            return Err(AppConfigError::MissingClusterId);
        }
        Ok(())
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances in tests.
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            config: AppConfig {
                database_url: "sqlite::memory:".to_string(),
                namespace: default_namespace(),
                conflict_retries: default_conflict_retries(),
                shutdown_timeout: default_shutdown_timeout(),
                ..Default::default()
            },
        }
    }
}

impl AppConfigBuilder {
    /// Sets the database URL.
    pub fn database_url(mut self, url: &str) -> Self {
        self.config.database_url = url.to_string();
        self
    }

    /// Sets the document namespace.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.config.namespace = namespace.to_string();
        self
    }

    /// Sets the local cluster id.
    pub fn cluster_id(mut self, cluster_id: &str) -> Self {
        self.config.cluster_id = cluster_id.to_string();
        self
    }

    /// Sets the service log API base URL.
    pub fn ocm_base_url(mut self, url: &str) -> Self {
        self.config.ocm.base_url = url.to_string();
        self
    }

    /// Sets the bound of a single send.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.ocm.send_timeout = timeout;
        self
    }

    /// Sets the conflict retry bound.
    pub fn conflict_retries(mut self, retries: u32) -> Self {
        self.config.conflict_retries = retries;
        self
    }

    /// Sets the server listen address.
    pub fn listen_address(mut self, address: &str) -> Self {
        self.config.server.listen_address = address.to_string();
        self
    }

    /// Sets the single-cluster definitions file.
    pub fn notification_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.notification_config_path = path.into();
        self
    }

    /// Sets the fleet definitions file.
    pub fn fleet_notification_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.fleet_notification_config_path = path.into();
        self
    }

    /// Returns the configuration.
    pub fn build(self) -> AppConfig {
        self.config
    }
}
