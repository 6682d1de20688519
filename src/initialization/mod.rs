//! This module provides the `InitializationService` responsible for loading
//! the notification definitions from the configuration directory into the
//! document store at startup.
//!
//! Definitions are upserted: the template part of a stored document is
//! replaced by the file content while the delivery records kept next to it
//! survive restarts.

use std::{collections::HashSet, path::Path, sync::Arc};

use crate::{
    config::{AppConfig, ConfigLoader},
    context::InitializationError,
    models::{
        FleetNotification, ManagedFleetNotification, ManagedNotification, NotificationTemplate,
    },
    persistence::{error::PersistenceError, traits::DocumentStore},
};

/// Top-level key of the single-cluster definitions file.
const MANAGED_NOTIFICATIONS_KEY: &str = "managed_notifications";

/// Top-level key of the fleet definitions file.
const FLEET_NOTIFICATIONS_KEY: &str = "fleet_notifications";

/// Loads and validates the single-cluster definitions in `path`.
pub fn load_notifications(path: &Path) -> Result<Vec<ManagedNotification>, InitializationError> {
    let documents: Vec<ManagedNotification> = ConfigLoader::new(path.to_path_buf())
        .load(MANAGED_NOTIFICATIONS_KEY)
        .map_err(|e| InitializationError::NotificationLoad(format!("{}: {e}", path.display())))?;

    let mut document_names = HashSet::new();
    for document in &documents {
        if document.name.is_empty() {
            return Err(InitializationError::NotificationLoad(
                "a managed notification has no name".to_string(),
            ));
        }
        if !document_names.insert(document.name.as_str()) {
            return Err(InitializationError::NotificationLoad(format!(
                "managed notification '{}' is defined twice",
                document.name
            )));
        }
        validate_templates(document.spec.notifications.iter())
            .map_err(InitializationError::NotificationLoad)?;
    }

    Ok(documents)
}

/// Loads and validates the fleet definitions in `path`.
pub fn load_fleet_notifications(
    path: &Path,
) -> Result<Vec<ManagedFleetNotification>, InitializationError> {
    let templates: Vec<FleetNotification> = ConfigLoader::new(path.to_path_buf())
        .load(FLEET_NOTIFICATIONS_KEY)
        .map_err(|e| {
            InitializationError::FleetNotificationLoad(format!("{}: {e}", path.display()))
        })?;

    validate_templates(templates.iter()).map_err(InitializationError::FleetNotificationLoad)?;

    Ok(templates.into_iter().map(ManagedFleetNotification::new).collect())
}

/// Checks that every template has a name, a summary and a unique name.
fn validate_templates<'a, T: NotificationTemplate + 'a>(
    templates: impl Iterator<Item = &'a T>,
) -> Result<(), String> {
    let mut names = HashSet::new();
    for template in templates {
        if template.name().is_empty() {
            return Err("a notification template has no name".to_string());
        }
        if template.summary().is_empty() {
            return Err(format!("notification template '{}' has no summary", template.name()));
        }
        if !names.insert(template.name().to_string()) {
            return Err(format!("notification template '{}' is defined twice", template.name()));
        }
    }
    Ok(())
}

/// A service responsible for initializing application state at startup.
pub struct InitializationService<S: DocumentStore> {
    config: AppConfig,
    store: Arc<S>,
}

impl<S: DocumentStore> InitializationService<S> {
    /// Creates a new `InitializationService`.
    pub fn new(config: AppConfig, store: Arc<S>) -> Self {
        Self { config, store }
    }

    /// Runs the initialization process, loading both definition files.
    pub async fn run(&self) -> Result<(), InitializationError> {
        self.load_notifications_from_file().await?;
        self.load_fleet_notifications_from_file().await?;
        Ok(())
    }

    pub(crate) async fn load_notifications_from_file(&self) -> Result<usize, InitializationError> {
        let namespace = &self.config.namespace;
        let config_path = &self.config.notification_config_path;

        if !config_path.exists() {
            tracing::info!(config_path = %config_path.display(), "No notification definitions file found. Skipping.");
            return Ok(0);
        }

        let documents = load_notifications(config_path)?;
        let count = documents.len();
        tracing::info!(count, "Loaded notification definitions from configuration file.");

        for document in documents {
            self.upsert_notification(document).await.map_err(|e| {
                InitializationError::NotificationLoad(format!(
                    "Failed to store notification definitions: {e}"
                ))
            })?;
        }
        tracing::info!(count, namespace = %namespace, "Notification definitions stored.");
        Ok(count)
    }

    pub(crate) async fn load_fleet_notifications_from_file(
        &self,
    ) -> Result<usize, InitializationError> {
        let namespace = &self.config.namespace;
        let config_path = &self.config.fleet_notification_config_path;

        if !config_path.exists() {
            tracing::info!(config_path = %config_path.display(), "No fleet notification definitions file found. Skipping.");
            return Ok(0);
        }

        let documents = load_fleet_notifications(config_path)?;
        let count = documents.len();
        tracing::info!(count, "Loaded fleet notification definitions from configuration file.");

        for document in documents {
            self.upsert_fleet_notification(document).await.map_err(|e| {
                InitializationError::FleetNotificationLoad(format!(
                    "Failed to store fleet notification definitions: {e}"
                ))
            })?;
        }
        tracing::info!(count, namespace = %namespace, "Fleet notification definitions stored.");
        Ok(count)
    }

    /// Stores `document`, keeping the delivery records of a stored version.
    async fn upsert_notification(&self, document: ManagedNotification) -> Result<(), PersistenceError> {
        let namespace = &self.config.namespace;
        match self.store.get_document::<ManagedNotification>(namespace, &document.name).await? {
            Some(existing) => {
                let mut updated = existing.value;
                updated.spec = document.spec;
                self.store.update_document(namespace, existing.version, &updated).await?;
                tracing::debug!(name = %updated.name, "Updated stored notification definitions.");
            }
            None => {
                self.store.create_document(namespace, &document).await?;
                tracing::debug!(name = %document.name, "Created notification definitions.");
            }
        }
        Ok(())
    }

    async fn upsert_fleet_notification(
        &self,
        document: ManagedFleetNotification,
    ) -> Result<(), PersistenceError> {
        let namespace = &self.config.namespace;
        match self.store.get_document::<ManagedFleetNotification>(namespace, &document.name).await? {
            Some(existing) => {
                self.store.update_document(namespace, existing.version, &document).await?;
            }
            None => {
                self.store.create_document(namespace, &document).await?;
            }
        }
        Ok(())
    }
}
