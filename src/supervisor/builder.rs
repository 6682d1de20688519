//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use super::{Supervisor, SupervisorError};
use crate::{
    config::AppConfig,
    context::AppMetrics,
    engine::{DispatchSettings, Dispatcher},
    notification::{ServiceLogSender, TemplateService},
    persistence::traits::DocumentStore,
};

/// A builder for creating a `Supervisor` instance.
pub struct SupervisorBuilder<S: DocumentStore + 'static> {
    config: Option<AppConfig>,
    store: Option<Arc<S>>,
    sender: Option<Arc<dyn ServiceLogSender>>,
    template_service: Option<Arc<TemplateService>>,
    app_metrics: Option<AppMetrics>,
}

impl<S: DocumentStore + 'static> Default for SupervisorBuilder<S> {
    fn default() -> Self {
        Self { config: None, store: None, sender: None, template_service: None, app_metrics: None }
    }
}

impl<S: DocumentStore + 'static> SupervisorBuilder<S> {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the document store for the `Supervisor`.
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the client service logs are sent through.
    pub fn sender(mut self, sender: Arc<dyn ServiceLogSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Sets the template service. A fresh one is used when unset.
    pub fn template_service(mut self, template_service: Arc<TemplateService>) -> Self {
        self.template_service = Some(template_service);
        self
    }

    /// Sets the shared metrics. Fresh metrics are used when unset.
    pub fn app_metrics(mut self, app_metrics: AppMetrics) -> Self {
        self.app_metrics = Some(app_metrics);
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    pub fn build(self) -> Result<Supervisor<S>, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let store = self.store.ok_or(SupervisorError::MissingDocumentStore)?;
        let sender = self.sender.ok_or(SupervisorError::MissingServiceLogSender)?;
        let template_service = self.template_service.unwrap_or_default();
        let app_metrics = self.app_metrics.unwrap_or_default();

        let settings = DispatchSettings::from(&config);
        tracing::debug!(namespace = %settings.namespace, cluster_id = %settings.cluster_id, "Building dispatcher.");
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            sender,
            template_service,
            app_metrics.clone(),
            settings,
        );

        Ok(Supervisor::new(config, store, app_metrics, Arc::new(dispatcher)))
    }
}
