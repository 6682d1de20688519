use thiserror::Error;

use crate::{
    config::AppConfigError,
    http_client::HttpClientPoolError,
    notification::NotificationError,
    persistence::error::PersistenceError,
};

/// Errors that can occur during application context initialization.
#[derive(Debug, Error)]
pub enum AppContextError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// The configuration loaded but cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] AppConfigError),

    /// Persistence error.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),

    /// Service log client error.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(#[from] InitializationError),
}

/// Errors that can occur during specific initialization steps.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// Failed to load single-cluster notification definitions.
    #[error("Failed to load notifications from file: {0}")]
    NotificationLoad(String),

    /// Failed to load fleet notification definitions.
    #[error("Failed to load fleet notifications from file: {0}")]
    FleetNotificationLoad(String),
}
