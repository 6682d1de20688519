//! Single-cluster notification templates and their delivery records.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{
    condition::Conditions,
    document::Document,
    ledger::{Ledger, LedgerDocument},
};

/// The content and policy of a service log, independent of the variant that
/// defines it.
pub trait NotificationTemplate: Send + Sync {
    /// Template name matched against the alert label.
    fn name(&self) -> &str;
    /// Service log summary.
    fn summary(&self) -> &str;
    /// Description sent while the alert fires.
    fn active_description(&self) -> &str;
    /// Description sent once the alert resolves; empty when none is sent.
    fn resolved_description(&self) -> &str;
    /// Service log severity.
    fn severity(&self) -> &str;
    /// Service log type.
    fn log_type(&self) -> &str;
    /// Documentation links attached to the service log.
    fn references(&self) -> &[String];
    /// Cool-down between two firing service logs.
    fn resend_wait(&self) -> Duration;
}

/// A notification template defined for the local cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Template name.
    pub name: String,
    /// Service log summary.
    pub summary: String,
    /// Description sent while the alert fires.
    pub active_body: String,
    /// Description sent when the alert resolves.
    #[serde(default)]
    pub resolved_body: String,
    /// Service log severity.
    pub severity: String,
    /// Cool-down between firing service logs, in hours.
    #[serde(default)]
    pub resend_wait: u32,
    /// Service log type.
    #[serde(default)]
    pub log_type: String,
    /// Documentation links.
    #[serde(default)]
    pub references: Vec<String>,
}

impl NotificationTemplate for Notification {
    fn name(&self) -> &str {
        &self.name
    }

    fn summary(&self) -> &str {
        &self.summary
    }

    fn active_description(&self) -> &str {
        &self.active_body
    }

    fn resolved_description(&self) -> &str {
        &self.resolved_body
    }

    fn severity(&self) -> &str {
        &self.severity
    }

    fn log_type(&self) -> &str {
        &self.log_type
    }

    fn references(&self) -> &[String] {
        &self.references
    }

    fn resend_wait(&self) -> Duration {
        Duration::hours(i64::from(self.resend_wait))
    }
}

/// Delivery history of one template on the local cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Name of the template the record belongs to.
    pub name: String,
    /// Number of service logs sent for the template.
    #[serde(default)]
    pub service_log_sent_count: u64,
    /// Condition ledger of the template.
    #[serde(default)]
    pub conditions: Conditions,
}

impl NotificationRecord {
    /// Creates an empty record for the named template.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

impl Ledger for NotificationRecord {
    fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }

    fn sent_count(&self) -> u64 {
        self.service_log_sent_count
    }

    fn increment_sent_count(&mut self) {
        self.service_log_sent_count += 1;
    }
}

/// Templates of a [`ManagedNotification`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedNotificationSpec {
    /// Notification templates.
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// Delivery records of a [`ManagedNotification`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedNotificationStatus {
    /// One record per template that was ever delivered.
    #[serde(default)]
    pub notification_records: Vec<NotificationRecord>,
}

/// A set of templates together with their delivery records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedNotification {
    /// Document name.
    pub name: String,
    /// Template definitions.
    #[serde(default)]
    pub spec: ManagedNotificationSpec,
    /// Delivery records.
    #[serde(default)]
    pub status: ManagedNotificationStatus,
}

impl ManagedNotification {
    /// Creates a document holding the given templates and no records.
    pub fn new(name: impl Into<String>, notifications: Vec<Notification>) -> Self {
        Self {
            name: name.into(),
            spec: ManagedNotificationSpec { notifications },
            status: ManagedNotificationStatus::default(),
        }
    }

    /// Looks up a template by name.
    pub fn notification(&self, name: &str) -> Option<&Notification> {
        self.spec.notifications.iter().find(|n| n.name == name)
    }

    /// Looks up the record of a template.
    pub fn record(&self, name: &str) -> Option<&NotificationRecord> {
        self.status.notification_records.iter().find(|r| r.name == name)
    }
}

impl Document for ManagedNotification {
    const KIND: &'static str = "ManagedNotification";

    fn name(&self) -> &str {
        &self.name
    }
}

impl LedgerDocument for ManagedNotification {
    /// Template name.
    type Slot = String;
    type Entry = NotificationRecord;

    fn entry(&self, slot: &String) -> Option<&NotificationRecord> {
        self.record(slot)
    }

    fn entry_or_insert(&mut self, slot: &String) -> &mut NotificationRecord {
        let records = &mut self.status.notification_records;
        let index = match records.iter().position(|r| &r.name == slot) {
            Some(index) => index,
            None => {
                records.push(NotificationRecord::new(slot.as_str()));
                records.len() - 1
            }
        };
        &mut records[index]
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::condition::ConditionType;

    #[test]
    fn test_entry_or_insert_creates_single_record() {
        let mut mn = ManagedNotification::new("sre", vec![]);
        let slot = "volume-filling-up".to_string();

        mn.entry_or_insert(&slot);
        mn.entry_or_insert(&slot);

        assert_eq!(mn.status.notification_records.len(), 1);
        assert!(mn.entry(&slot).unwrap().conditions.is_empty());
    }

    #[test]
    fn test_record_send_updates_ledger_and_counter() {
        let mut record = NotificationRecord::new("volume-filling-up");
        let now = Utc::now();

        record.record_send(false, now);

        assert!(!record.conditions.is_true(ConditionType::AlertFiring));
        assert!(record.conditions.is_true(ConditionType::AlertResolved));
        assert!(record.conditions.is_true(ConditionType::ServiceLogSent));
        assert_eq!(record.sent_count(), 1);
    }

    #[test]
    fn test_resend_wait_is_in_hours() {
        let notification = Notification { resend_wait: 24, ..Default::default() };
        assert_eq!(NotificationTemplate::resend_wait(&notification), Duration::hours(24));
    }
}
