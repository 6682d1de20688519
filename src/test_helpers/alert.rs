//! A builder for creating `Alert` instances in tests.

use std::collections::HashMap;

use crate::models::{
    Alert, AmReceiverData,
    alert::{
        LABEL_ALERT_NAME, LABEL_HOSTED_CLUSTER_ID, LABEL_MANAGEMENT_CLUSTER_ID,
        LABEL_SEND_NOTIFICATION, LABEL_TEMPLATE_NAME, STATUS_FIRING, STATUS_RESOLVED,
    },
};

/// A builder for creating `Alert` instances in tests.
///
/// A new builder describes a firing, actionable alert without a template.
pub struct AlertBuilder {
    status: String,
    labels: HashMap<String, String>,
    annotations: HashMap<String, String>,
}

impl AlertBuilder {
    /// Creates a firing alert named `alert_name` marked for delivery.
    pub fn new(alert_name: &str) -> Self {
        let labels = HashMap::from([
            (LABEL_ALERT_NAME.to_string(), alert_name.to_string()),
            (LABEL_SEND_NOTIFICATION.to_string(), "true".to_string()),
        ]);
        Self { status: STATUS_FIRING.to_string(), labels, annotations: HashMap::new() }
    }

    /// Sets the template the alert refers to.
    pub fn template(self, template_name: &str) -> Self {
        self.label(LABEL_TEMPLATE_NAME, template_name)
    }

    /// Sets the management and hosted cluster ids of a fleet alert.
    pub fn fleet(self, management_cluster_id: &str, hosted_cluster_id: &str) -> Self {
        self.label(LABEL_MANAGEMENT_CLUSTER_ID, management_cluster_id)
            .label(LABEL_HOSTED_CLUSTER_ID, hosted_cluster_id)
    }

    /// Marks the alert as resolved.
    pub fn resolved(mut self) -> Self {
        self.status = STATUS_RESOLVED.to_string();
        self
    }

    /// Sets a label.
    pub fn label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name.to_string(), value.to_string());
        self
    }

    /// Removes a label.
    pub fn without_label(mut self, name: &str) -> Self {
        self.labels.remove(name);
        self
    }

    /// Sets an annotation.
    pub fn annotation(mut self, name: &str, value: &str) -> Self {
        self.annotations.insert(name.to_string(), value.to_string());
        self
    }

    /// Builds the `Alert`.
    pub fn build(self) -> Alert {
        Alert {
            status: self.status,
            labels: self.labels,
            annotations: self.annotations,
            ..Default::default()
        }
    }
}

/// Wraps alerts into a webhook payload.
pub fn receiver_data(alerts: Vec<Alert>) -> AmReceiverData {
    let status =
        if alerts.iter().any(Alert::is_firing) { STATUS_FIRING } else { STATUS_RESOLVED };
    AmReceiverData {
        receiver: "ocmagent".to_string(),
        status: status.to_string(),
        alerts,
        ..Default::default()
    }
}
