//! Validates the configuration directory without touching the database.

use clap::Parser;
use thiserror::Error;

use crate::{
    config::{AppConfig, AppConfigError},
    context::InitializationError,
    initialization::{load_fleet_notifications, load_notifications},
    notification::{NotificationError, OcmClient},
};

/// Reasons a configuration directory is rejected.
#[derive(Error, Debug)]
pub enum Error {
    /// `app.yaml` is missing or malformed.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    /// `app.yaml` loads but misses a required setting.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] AppConfigError),
    /// A definition file is malformed or inconsistent.
    #[error("Definition error: {0}")]
    Definitions(#[from] InitializationError),
    /// The service log API settings are unusable.
    #[error("Service log client error: {0}")]
    Client(#[from] NotificationError),
}

/// Arguments of the `check-config` subcommand.
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Directory holding `app.yaml` and the definition files.
    #[arg(short, long, default_value = "configs")]
    pub config_dir: String,
}

/// What a successful check found.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Number of single-cluster notification documents.
    pub managed_notifications: usize,
    /// Number of single-cluster templates across those documents.
    pub templates: usize,
    /// Number of fleet templates.
    pub fleet_notifications: usize,
}

/// Loads `app.yaml` and both definition files from `args.config_dir`.
pub fn execute(args: &CheckConfigArgs) -> Result<CheckReport, Error> {
    let config = AppConfig::new(Some(&args.config_dir))?;
    config.validate()?;
    OcmClient::endpoint_for(&config.ocm)?;

    let mut report = CheckReport::default();
    if config.notification_config_path.exists() {
        let documents = load_notifications(&config.notification_config_path)?;
        report.managed_notifications = documents.len();
        report.templates = documents.iter().map(|d| d.spec.notifications.len()).sum();
    }
    if config.fleet_notification_config_path.exists() {
        report.fleet_notifications =
            load_fleet_notifications(&config.fleet_notification_config_path)?.len();
    }

    tracing::info!(
        config_dir = %args.config_dir,
        managed_notifications = report.managed_notifications,
        templates = report.templates,
        fleet_notifications = report.fleet_notifications,
        "Configuration is valid."
    );
    Ok(report)
}
