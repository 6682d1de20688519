//! Turns alert webhooks into service logs.
//!
//! For every alert of a batch the dispatcher validates the labels, finds the
//! template, loads the record of the target cluster, asks the resend policy
//! whether a service log is due, sends it and records the delivery. Records
//! are written with optimistic concurrency: a stale write is re-applied on a
//! fresh copy of the document, a bounded number of times.
//!
//! The dispatcher posts a service log once per decision. If recording a
//! confirmed delivery fails, the error is reported and the delivery stands.
//! Delivery is at least once: the HTTP client may repeat a post the API had
//! already accepted (see `http_client::client`).

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::{
    matcher::{self, MatchError},
    policy::ResendPolicy,
};
use crate::{
    config::AppConfig,
    context::{AppMetrics, SERVICE_LOGS_API},
    models::{
        Alert, AmReceiverData, Conditions, Document, FleetSlot, Ledger, LedgerDocument,
        ManagedFleetNotification, ManagedFleetNotificationRecord, ManagedNotification,
        NotificationTemplate, Versioned, alert::LABEL_ALERT_NAME,
    },
    notification::{ClusterRef, NotificationError, ServiceLog, ServiceLogSender, TemplateService},
    persistence::{error::PersistenceError, traits::DocumentStore},
};

/// Errors that can occur while dispatching a single alert.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The alert could not be matched to a template.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Reading or writing a document failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The service log could not be rendered or sent.
    #[error("Failed to send service log: {0}")]
    Send(#[from] NotificationError),

    /// The record kept changing under us.
    #[error("Gave up updating '{name}' after {retries} concurrent modifications")]
    ConflictRetriesExhausted {
        /// Name of the document that could not be written.
        name: String,
        /// Number of re-applied writes.
        retries: u32,
    },
}

impl DispatchError {
    /// Returns `true` when the alert simply does not ask for a service log.
    pub fn is_not_actionable(&self) -> bool {
        matches!(self, DispatchError::Match(e) if e.is_not_actionable())
    }
}

/// What happened to an alert that was processed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A service log was sent and recorded.
    Sent,
    /// No service log was due.
    Skipped,
}

/// Per batch tally, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Alerts a service log was sent for.
    pub sent: usize,
    /// Alerts that needed no service log.
    pub skipped: usize,
    /// Alerts whose processing failed.
    pub failed: usize,
    /// Whether processing stopped early on shutdown.
    pub cancelled: bool,
}

impl BatchSummary {
    fn record(&mut self, result: &Result<DispatchOutcome, DispatchError>) {
        match result {
            Ok(DispatchOutcome::Sent) => self.sent += 1,
            Ok(DispatchOutcome::Skipped) => self.skipped += 1,
            Err(e) if e.is_not_actionable() => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// The settings the dispatcher reads from the application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Namespace definitions and records are kept in.
    pub namespace: String,
    /// External id of the local cluster.
    pub cluster_id: String,
    /// Upper bound of a single send.
    pub send_timeout: Duration,
    /// How often a conflicting write is re-applied.
    pub conflict_retries: u32,
}

impl From<&AppConfig> for DispatchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            cluster_id: config.cluster_id.clone(),
            send_timeout: config.ocm.send_timeout,
            conflict_retries: config.conflict_retries,
        }
    }
}

/// Dispatches service logs for single-cluster and fleet alerts.
pub struct Dispatcher<S: DocumentStore> {
    store: Arc<S>,
    sender: Arc<dyn ServiceLogSender>,
    templates: Arc<TemplateService>,
    metrics: AppMetrics,
    settings: DispatchSettings,
}

impl<S: DocumentStore> Dispatcher<S> {
    /// Creates a new `Dispatcher`.
    pub fn new(
        store: Arc<S>,
        sender: Arc<dyn ServiceLogSender>,
        templates: Arc<TemplateService>,
        metrics: AppMetrics,
        settings: DispatchSettings,
    ) -> Self {
        Self { store, sender, templates, metrics, settings }
    }

    /// The settings this dispatcher runs with.
    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Processes the firing, then the resolved alerts of a single-cluster
    /// webhook.
    ///
    /// Fails only when the definitions cannot be listed. Errors of single
    /// alerts are logged and do not stop the batch. Once `cancel` fires an
    /// in-flight send is abandoned and no further alert is started.
    #[tracing::instrument(skip_all, fields(alerts = data.alerts.len()), level = "debug")]
    pub async fn process_cluster_batch(
        &self,
        data: &AmReceiverData,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, DispatchError> {
        let documents =
            self.store.list_documents::<ManagedNotification>(&self.settings.namespace).await?;

        let mut summary = BatchSummary::default();
        for alert in data.firing().chain(data.resolved()) {
            if cancel.is_cancelled() {
                tracing::warn!("Shutdown requested, leaving the rest of the batch unprocessed.");
                summary.cancelled = true;
                break;
            }
            let result = self.process_alert(alert, &documents, cancel).await;
            log_result(alert, &result);
            summary.record(&result);
        }

        tracing::debug!(?summary, "Single-cluster batch processed.");
        Ok(summary)
    }

    /// Processes one single-cluster alert against the listed definitions.
    pub async fn process_alert(
        &self,
        alert: &Alert,
        documents: &[Versioned<ManagedNotification>],
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        let valid = matcher::validate_alert(alert)?;
        let (listed, notification) = matcher::find_notification(documents, valid.template_name)?;

        // The listing may predate an earlier alert of the same batch.
        let current = self
            .store
            .get_document::<ManagedNotification>(&self.settings.namespace, &listed.value.name)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(listed.value.name.clone()))?;

        let cluster = ClusterRef::ExternalId(self.settings.cluster_id.clone());
        self.dispatch(current, notification.name.clone(), notification, cluster, alert, cancel).await
    }

    /// Processes the firing, then the resolved alerts of a fleet webhook.
    #[tracing::instrument(skip_all, fields(alerts = data.alerts.len()), level = "debug")]
    pub async fn process_fleet_batch(
        &self,
        data: &AmReceiverData,
        cancel: &CancellationToken,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for alert in data.firing().chain(data.resolved()) {
            if cancel.is_cancelled() {
                tracing::warn!("Shutdown requested, leaving the rest of the batch unprocessed.");
                summary.cancelled = true;
                break;
            }
            let result = self.process_fleet_alert(alert, cancel).await;
            log_result(alert, &result);
            summary.record(&result);
        }

        tracing::debug!(?summary, "Fleet batch processed.");
        summary
    }

    /// Processes one fleet alert.
    pub async fn process_fleet_alert(
        &self,
        alert: &Alert,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        let valid = matcher::validate_alert(alert)?;
        let ids = matcher::fleet_ids(alert)?;

        let definition = self
            .store
            .get_document::<ManagedFleetNotification>(&self.settings.namespace, valid.template_name)
            .await?
            .ok_or_else(|| MatchError::TemplateNotFound(valid.template_name.to_string()))?;
        let template = &definition.value.spec.fleet_notification;

        // Nothing can be sent, so the record is left alone.
        if !alert.is_firing() && template.resolved_message.is_empty() {
            tracing::debug!(notification = %template.name, "No resolved message configured, skipping.");
            return Ok(DispatchOutcome::Skipped);
        }

        let record = self.ensure_fleet_record(ids.management_cluster_id).await?;
        let slot = FleetSlot {
            notification_name: template.name.clone(),
            resend_wait: template.resend_wait,
            hosted_cluster_id: ids.hosted_cluster_id.to_string(),
        };
        let cluster = ClusterRef::InternalId(ids.hosted_cluster_id.to_string());

        self.dispatch(record, slot, template, cluster, alert, cancel).await
    }

    /// Returns the record of a management cluster, creating it when missing.
    ///
    /// The returned record always carries an initialized status, written to
    /// the store before the caller decides anything.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn ensure_fleet_record(
        &self,
        management_cluster_id: &str,
    ) -> Result<Versioned<ManagedFleetNotificationRecord>, DispatchError> {
        let namespace = &self.settings.namespace;

        let record = match self
            .store
            .get_document::<ManagedFleetNotificationRecord>(namespace, management_cluster_id)
            .await?
        {
            Some(record) => record,
            None => {
                let initial = ManagedFleetNotificationRecord::new(management_cluster_id);
                match self.store.create_document(namespace, &initial).await {
                    Ok(created) => {
                        tracing::info!(management_cluster = %management_cluster_id, "Created fleet notification record.");
                        created
                    }
                    // Another request created it first.
                    Err(PersistenceError::AlreadyExists(_)) => self
                        .store
                        .get_document::<ManagedFleetNotificationRecord>(namespace, management_cluster_id)
                        .await?
                        .ok_or_else(|| PersistenceError::NotFound(management_cluster_id.to_string()))?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if record.value.has_status() {
            return Ok(record);
        }

        tracing::debug!(management_cluster = %management_cluster_id, "Initializing fleet record status.");
        self.persist_with_retry(record, |r: &mut ManagedFleetNotificationRecord| {
            if !r.has_status() {
                r.initialize_status();
            }
        })
        .await
    }

    /// Decides, sends and records one service log for the ledger at `slot`.
    async fn dispatch<D: LedgerDocument>(
        &self,
        current: Versioned<D>,
        slot: D::Slot,
        template: &dyn NotificationTemplate,
        cluster: ClusterRef,
        alert: &Alert,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        let is_firing = alert.is_firing();
        let now = Utc::now();
        let resend_wait =
            current.value.stored_resend_wait(&slot).unwrap_or_else(|| template.resend_wait());
        let policy =
            ResendPolicy::new(resend_wait, !template.resolved_description().is_empty());

        let empty = Conditions::new();
        let conditions = current.value.entry(&slot).map_or(&empty, |e| e.conditions());
        if !policy.can_send(conditions, is_firing, now) {
            tracing::info!(
                notification = template.name(),
                cluster = cluster.id(),
                is_firing,
                resend_wait_hours = resend_wait.num_hours(),
                "Service log not due, skipping."
            );
            return Ok(DispatchOutcome::Skipped);
        }

        let service_log = self.render_service_log(template, cluster, alert)?;
        self.send(&service_log, cancel).await?;
        self.metrics.count_service_log_sent(template.name(), is_firing).await;
        tracing::info!(
            notification = template.name(),
            cluster = service_log.cluster.id(),
            is_firing,
            "Service log sent."
        );

        self.record_delivery(current, &slot, is_firing, now).await?;
        Ok(DispatchOutcome::Sent)
    }

    fn render_service_log(
        &self,
        template: &dyn NotificationTemplate,
        cluster: ClusterRef,
        alert: &Alert,
    ) -> Result<ServiceLog, NotificationError> {
        let render = |text: &str| self.templates.render_for_alert(text, alert);
        Ok(ServiceLog {
            summary: render(template.summary())?,
            active_description: render(template.active_description())?,
            resolved_description: render(template.resolved_description())?,
            cluster,
            severity: template.severity().to_string(),
            log_type: template.log_type().to_string(),
            references: template.references().to_vec(),
            is_firing: alert.is_firing(),
        })
    }

    /// Sends a service log within the configured time bound. A send cut
    /// short by `cancel` counts as failed, the ledger stays untouched.
    async fn send(
        &self,
        service_log: &ServiceLog,
        cancel: &CancellationToken,
    ) -> Result<(), NotificationError> {
        let timeout = self.settings.send_timeout;
        let bounded = tokio::time::timeout(timeout, self.sender.send_service_log(service_log));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(cluster = service_log.cluster.id(), "Shutdown requested, abandoning service log send.");
                return Err(NotificationError::Cancelled);
            }
            outcome = bounded => match outcome {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(timeout)),
            },
        };

        match &result {
            Ok(()) => self.metrics.reset_response_failures(SERVICE_LOGS_API).await,
            Err(_) => self.metrics.record_response_failure(SERVICE_LOGS_API).await,
        }
        result
    }

    async fn record_delivery<D: LedgerDocument>(
        &self,
        current: Versioned<D>,
        slot: &D::Slot,
        is_firing: bool,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let name = current.value.name().to_string();
        self.persist_with_retry(current, |document: &mut D| {
            document.entry_or_insert(slot).record_send(is_firing, now);
        })
        .await
        .inspect_err(|e| {
            tracing::error!(document = %name, ?slot, error = %e, "Service log was sent but could not be recorded.");
        })?;
        Ok(())
    }

    /// Applies `mutate` to `current` and writes it. On a conflict the
    /// document is re-read and `mutate` applied again, up to the configured
    /// number of times.
    async fn persist_with_retry<D, F>(
        &self,
        mut current: Versioned<D>,
        mutate: F,
    ) -> Result<Versioned<D>, DispatchError>
    where
        D: Document,
        F: Fn(&mut D) + Send + Sync,
    {
        let namespace = &self.settings.namespace;
        let name = current.value.name().to_string();
        let mut retries = 0;

        loop {
            let mut updated = current.value.clone();
            mutate(&mut updated);

            match self.store.update_document(namespace, current.version, &updated).await {
                Ok(stored) => return Ok(stored),
                Err(e) if e.is_conflict() => {
                    if retries >= self.settings.conflict_retries {
                        return Err(DispatchError::ConflictRetriesExhausted { name, retries });
                    }
                    retries += 1;
                    tracing::debug!(kind = D::KIND, document = %name, retries, "Write conflict, re-reading document.");
                    current = self
                        .store
                        .get_document::<D>(namespace, &name)
                        .await?
                        .ok_or_else(|| PersistenceError::NotFound(name.clone()))?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn log_result(alert: &Alert, result: &Result<DispatchOutcome, DispatchError>) {
    let alert_name = alert.label(LABEL_ALERT_NAME).unwrap_or_default();
    match result {
        Ok(_) => {}
        Err(e) if e.is_not_actionable() => {
            tracing::info!(alert = alert_name, "Alert is not actionable, skipping.");
        }
        Err(DispatchError::Match(e)) => {
            tracing::warn!(alert = alert_name, error = %e, "Alert could not be matched.");
        }
        Err(e) => {
            tracing::error!(alert = alert_name, error = %e, "Failed to process alert.");
        }
    }
}
