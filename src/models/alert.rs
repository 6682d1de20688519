//! Alertmanager webhook payloads received by the relay.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label carrying the Prometheus alert name.
pub const LABEL_ALERT_NAME: &str = "alertname";

/// Label naming the notification template to deliver.
pub const LABEL_TEMPLATE_NAME: &str = "managed_notification_template";

/// Label marking an alert as one that should produce a service log.
pub const LABEL_SEND_NOTIFICATION: &str = "send_managed_notification";

/// Label carrying the management cluster id of a fleet alert.
pub const LABEL_MANAGEMENT_CLUSTER_ID: &str = "_mc_id";

/// Label carrying the hosted cluster id of a fleet alert.
pub const LABEL_HOSTED_CLUSTER_ID: &str = "_id";

/// Alert status reported by Alertmanager for an active alert.
pub const STATUS_FIRING: &str = "firing";

/// Alert status reported by Alertmanager for a cleared alert.
pub const STATUS_RESOLVED: &str = "resolved";

/// A single alert of a receiver payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alert {
    /// `firing` or `resolved`.
    pub status: String,
    /// Identifying labels of the alert.
    pub labels: HashMap<String, String>,
    /// Free-form annotations of the alert.
    pub annotations: HashMap<String, String>,
    /// When the alert started firing.
    pub starts_at: Option<DateTime<Utc>>,
    /// When the alert resolved, or the zero time while firing.
    pub ends_at: Option<DateTime<Utc>>,
    /// Link back to the rule that produced the alert.
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    /// Alertmanager fingerprint of the label set.
    pub fingerprint: String,
}

impl Alert {
    /// Returns the value of a label.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Returns `true` if Alertmanager reports the alert as firing.
    pub fn is_firing(&self) -> bool {
        self.status == STATUS_FIRING
    }

    /// Returns `true` if Alertmanager reports the alert as resolved.
    pub fn is_resolved(&self) -> bool {
        self.status == STATUS_RESOLVED
    }
}

/// The body Alertmanager posts to a webhook receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmReceiverData {
    /// Name of the receiver that matched.
    pub receiver: String,
    /// Status of the whole group.
    pub status: String,
    /// Alerts of the group.
    pub alerts: Vec<Alert>,
    /// Labels used for grouping.
    pub group_labels: HashMap<String, String>,
    /// Labels shared by every alert of the group.
    pub common_labels: HashMap<String, String>,
    /// Annotations shared by every alert of the group.
    pub common_annotations: HashMap<String, String>,
    /// Link back to the Alertmanager instance.
    #[serde(rename = "externalURL")]
    pub external_url: String,
}

impl AmReceiverData {
    /// Iterates over the firing alerts of the payload.
    pub fn firing(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_firing())
    }

    /// Iterates over the resolved alerts of the payload.
    pub fn resolved(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_resolved())
    }
}

/// The JSON body the receiver answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmReceiverResponse {
    /// Human readable outcome, `ok` on success.
    pub status: String,
    /// HTTP status code of the response.
    pub code: u16,
    /// Error message, `null` on success.
    pub error: Option<String>,
}

impl AmReceiverResponse {
    /// A successful response.
    pub fn ok() -> Self {
        Self { status: "ok".to_string(), code: 200, error: None }
    }

    /// A failed response carrying the given status message and error.
    pub fn failed(code: u16, status: impl Into<String>, error: impl ToString) -> Self {
        Self { status: status.into(), code, error: Some(error.to_string()) }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_alertmanager_payload() {
        let body = json!({
            "receiver": "ocmagent",
            "status": "firing",
            "alerts": [
                {
                    "status": "firing",
                    "labels": { "alertname": "KubePersistentVolumeFillingUp" },
                    "annotations": {},
                    "startsAt": "2024-05-01T10:00:00Z",
                    "endsAt": "0001-01-01T00:00:00Z",
                    "generatorURL": "http://prometheus/graph",
                    "fingerprint": "abc"
                },
                { "status": "resolved", "labels": {} }
            ],
            "groupLabels": {},
            "commonLabels": {},
            "commonAnnotations": {},
            "externalURL": "http://alertmanager"
        });

        let data: AmReceiverData = serde_json::from_value(body).unwrap();

        assert_eq!(data.alerts.len(), 2);
        assert_eq!(data.firing().count(), 1);
        assert_eq!(data.resolved().count(), 1);
        assert_eq!(data.alerts[0].label(LABEL_ALERT_NAME), Some("KubePersistentVolumeFillingUp"));
        assert!(data.alerts[0].starts_at.is_some());
    }

    #[test]
    fn test_decode_minimal_payload() {
        let data: AmReceiverData = serde_json::from_str(r#"{"status":"foo"}"#).unwrap();
        assert_eq!(data.status, "foo");
        assert!(data.alerts.is_empty());
    }

    #[test]
    fn test_decode_rejects_non_object_body() {
        assert!(serde_json::from_str::<AmReceiverData>(r#""""#).is_err());
    }

    #[test]
    fn test_unknown_status_is_neither_firing_nor_resolved() {
        let alert = Alert { status: "suppressed".to_string(), ..Default::default() };
        assert!(!alert.is_firing());
        assert!(!alert.is_resolved());
    }

    #[test]
    fn test_ok_response_serializes_null_error() {
        let value = serde_json::to_value(AmReceiverResponse::ok()).unwrap();
        assert_eq!(value, json!({ "status": "ok", "code": 200, "error": null }));
    }
}
