//! Fleet notification templates and the per management cluster records that
//! track deliveries to each hosted cluster.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{
    condition::Conditions,
    document::Document,
    ledger::{Ledger, LedgerDocument},
    notification::NotificationTemplate,
};

/// A notification template shared by every hosted cluster of the fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetNotification {
    /// Template name.
    pub name: String,
    /// Service log summary.
    pub summary: String,
    /// Description sent while the alert fires.
    pub notification_message: String,
    /// Description sent when the alert resolves; nothing is sent when empty.
    #[serde(default)]
    pub resolved_message: String,
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

impl NotificationTemplate for FleetNotification {
    fn name(&self) -> &str {
        &self.name
    }

    fn summary(&self) -> &str {
        &self.summary
    }

    fn active_description(&self) -> &str {
        &self.notification_message
    }

    fn resolved_description(&self) -> &str {
        &self.resolved_message
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

/// Spec of a [`ManagedFleetNotification`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFleetNotificationSpec {
    /// The template.
    pub fleet_notification: FleetNotification,
}

/// A stored fleet template, named after the template it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFleetNotification {
    /// Document name, equal to the template name.
    pub name: String,
    /// The template.
    pub spec: ManagedFleetNotificationSpec,
}

impl ManagedFleetNotification {
    /// Wraps a template into a document named after it.
    pub fn new(fleet_notification: FleetNotification) -> Self {
        Self {
            name: fleet_notification.name.clone(),
            spec: ManagedFleetNotificationSpec { fleet_notification },
        }
    }
}

impl Document for ManagedFleetNotification {
    const KIND: &'static str = "ManagedFleetNotification";

    fn name(&self) -> &str {
        &self.name
    }
}

/// Delivery history of one template for one hosted cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecordItem {
    /// The hosted cluster the item tracks.
    #[serde(rename = "hostedClusterID")]
    pub hosted_cluster_id: String,
    /// Number of service logs sent to the hosted cluster.
    #[serde(default)]
    pub service_log_sent_count: u64,
    /// Condition ledger of the hosted cluster.
    #[serde(default)]
    pub conditions: Conditions,
}

impl Ledger for NotificationRecordItem {
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

/// Items of one template under a management cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecordByName {
    /// Template name.
    pub notification_name: String,
    /// Resend wait in hours, copied from the template when the entry was
    /// created.
    pub resend_wait: u32,
    /// One item per hosted cluster.
    #[serde(default)]
    pub notification_record_items: Vec<NotificationRecordItem>,
}

impl NotificationRecordByName {
    /// Returns the item of a hosted cluster, adding an empty one if needed.
    pub fn item_or_insert(&mut self, hosted_cluster_id: &str) -> &mut NotificationRecordItem {
        let items = &mut self.notification_record_items;
        let index = match items.iter().position(|i| i.hosted_cluster_id == hosted_cluster_id) {
            Some(index) => index,
            None => {
                items.push(NotificationRecordItem {
                    hosted_cluster_id: hosted_cluster_id.to_string(),
                    ..Default::default()
                });
                items.len() - 1
            }
        };
        &mut items[index]
    }

    /// Returns the item of a hosted cluster.
    pub fn item(&self, hosted_cluster_id: &str) -> Option<&NotificationRecordItem> {
        self.notification_record_items.iter().find(|i| i.hosted_cluster_id == hosted_cluster_id)
    }
}

/// Status of a [`ManagedFleetNotificationRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFleetNotificationRecordStatus {
    /// The management cluster the record belongs to; empty until the initial
    /// status has been written.
    #[serde(default)]
    pub management_cluster: String,
    /// Per template entries.
    #[serde(default)]
    pub notification_record_by_name: Vec<NotificationRecordByName>,
}

/// Delivery records of every hosted cluster under one management cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedFleetNotificationRecord {
    /// Document name, equal to the management cluster id.
    pub name: String,
    /// Delivery records.
    #[serde(default)]
    pub status: ManagedFleetNotificationRecordStatus,
}

impl ManagedFleetNotificationRecord {
    /// Creates a record with an initialized, empty status.
    pub fn new(management_cluster_id: impl Into<String>) -> Self {
        let management_cluster_id = management_cluster_id.into();
        let mut record = Self { name: management_cluster_id, ..Default::default() };
        record.initialize_status();
        record
    }

    /// Returns `true` once the initial status has been set.
    pub fn has_status(&self) -> bool {
        !self.status.management_cluster.is_empty()
    }

    /// Sets the initial status: the owning management cluster and no entries.
    pub fn initialize_status(&mut self) {
        self.status.management_cluster = self.name.clone();
        self.status.notification_record_by_name = Vec::new();
    }

    /// Looks up the entry of a template.
    pub fn record_by_name(&self, notification_name: &str) -> Option<&NotificationRecordByName> {
        self.status
            .notification_record_by_name
            .iter()
            .find(|r| r.notification_name == notification_name)
    }
}

impl Document for ManagedFleetNotificationRecord {
    const KIND: &'static str = "ManagedFleetNotificationRecord";

    fn name(&self) -> &str {
        &self.name
    }
}

/// Addresses a hosted cluster ledger inside a fleet record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSlot {
    /// Template name.
    pub notification_name: String,
    /// Resend wait of the template in hours, used when the entry is created.
    pub resend_wait: u32,
    /// Hosted cluster id.
    pub hosted_cluster_id: String,
}

impl LedgerDocument for ManagedFleetNotificationRecord {
    type Slot = FleetSlot;
    type Entry = NotificationRecordItem;

    fn entry(&self, slot: &FleetSlot) -> Option<&NotificationRecordItem> {
        self.record_by_name(&slot.notification_name)?.item(&slot.hosted_cluster_id)
    }

    fn entry_or_insert(&mut self, slot: &FleetSlot) -> &mut NotificationRecordItem {
        let records = &mut self.status.notification_record_by_name;
        let index = match records.iter().position(|r| r.notification_name == slot.notification_name)
        {
            Some(index) => index,
            None => {
                records.push(NotificationRecordByName {
                    notification_name: slot.notification_name.clone(),
                    resend_wait: slot.resend_wait,
                    notification_record_items: Vec::new(),
                });
                records.len() - 1
            }
        };
        records[index].item_or_insert(&slot.hosted_cluster_id)
    }

    fn stored_resend_wait(&self, slot: &FleetSlot) -> Option<Duration> {
        self.record_by_name(&slot.notification_name).map(|r| Duration::hours(i64::from(r.resend_wait)))
    }
}
