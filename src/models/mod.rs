//! Data models of the relay: webhook payloads, notification templates and the
//! delivery records kept for them.

pub mod alert;
pub mod condition;
pub mod document;
pub mod fleet;
pub mod ledger;
pub mod notification;

pub use alert::{Alert, AmReceiverData, AmReceiverResponse};
pub use condition::{Condition, ConditionType, Conditions};
pub use document::{Document, Versioned};
pub use fleet::{
    FleetNotification, FleetSlot, ManagedFleetNotification, ManagedFleetNotificationRecord,
    NotificationRecordByName, NotificationRecordItem,
};
pub use ledger::{Ledger, LedgerDocument};
pub use notification::{
    ManagedNotification, Notification, NotificationRecord, NotificationTemplate,
};
