//! Builders for notification templates used in tests.

use crate::models::{FleetNotification, ManagedNotification, Notification};

/// A builder for creating single-cluster `Notification` templates in tests.
pub struct NotificationBuilder {
    notification: Notification,
}

impl NotificationBuilder {
    /// Creates a template with a summary, an active body and no resolved body.
    pub fn new(name: &str) -> Self {
        Self {
            notification: Notification {
                name: name.to_string(),
                summary: format!("{name} summary"),
                active_body: format!("{name} is firing"),
                severity: "Warning".to_string(),
                log_type: "cluster-state".to_string(),
                ..Default::default()
            },
        }
    }

    /// Sets the summary.
    pub fn summary(mut self, summary: &str) -> Self {
        self.notification.summary = summary.to_string();
        self
    }

    /// Sets the body sent while the alert fires.
    pub fn active_body(mut self, body: &str) -> Self {
        self.notification.active_body = body.to_string();
        self
    }

    /// Sets the body sent once the alert resolves.
    pub fn resolved_body(mut self, body: &str) -> Self {
        self.notification.resolved_body = body.to_string();
        self
    }

    /// Sets the resend wait in hours.
    pub fn resend_wait(mut self, hours: u32) -> Self {
        self.notification.resend_wait = hours;
        self
    }

    /// Builds the `Notification`.
    pub fn build(self) -> Notification {
        self.notification
    }

    /// Builds a `ManagedNotification` named `document_name` holding only this
    /// template.
    pub fn into_managed(self, document_name: &str) -> ManagedNotification {
        ManagedNotification::new(document_name, vec![self.notification])
    }
}

/// A builder for creating `FleetNotification` templates in tests.
pub struct FleetNotificationBuilder {
    notification: FleetNotification,
}

impl FleetNotificationBuilder {
    /// Creates a template with a summary, a message and no resolved message.
    pub fn new(name: &str) -> Self {
        Self {
            notification: FleetNotification {
                name: name.to_string(),
                summary: format!("{name} summary"),
                notification_message: format!("{name} is firing"),
                severity: "Info".to_string(),
                log_type: "cluster-state".to_string(),
                ..Default::default()
            },
        }
    }

    /// Sets the message sent once the alert resolves.
    pub fn resolved_message(mut self, message: &str) -> Self {
        self.notification.resolved_message = message.to_string();
        self
    }

    /// Sets the resend wait in hours.
    pub fn resend_wait(mut self, hours: u32) -> Self {
        self.notification.resend_wait = hours;
        self
    }

    /// Builds the `FleetNotification`.
    pub fn build(self) -> FleetNotification {
        self.notification
    }
}
