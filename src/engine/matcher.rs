//! Validation of inbound alerts and lookup of the template they refer to.

use thiserror::Error;

use crate::models::{
    Alert, ManagedNotification, Notification, Versioned,
    alert::{
        LABEL_ALERT_NAME, LABEL_HOSTED_CLUSTER_ID, LABEL_MANAGEMENT_CLUSTER_ID,
        LABEL_SEND_NOTIFICATION, LABEL_TEMPLATE_NAME,
    },
};

/// Value of the send label that marks an alert as actionable.
const SEND_NOTIFICATION_ENABLED: &str = "true";

/// Reasons an alert cannot be matched to a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    /// A label required to process the alert is missing or empty.
    #[error("alert is missing required label '{0}'")]
    MissingLabel(&'static str),

    /// The alert does not ask for a service log.
    #[error("alert is not marked with send_managed_notification=true")]
    NotActionable,

    /// No template with the requested name exists.
    #[error("template not found: {0}")]
    TemplateNotFound(String),
}

impl MatchError {
    /// Returns `true` when the alert simply does not ask for a service log.
    pub fn is_not_actionable(&self) -> bool {
        matches!(self, MatchError::NotActionable)
    }
}

/// A validated alert: the template it refers to and its alert name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidAlert<'a> {
    /// Prometheus alert name.
    pub alert_name: &'a str,
    /// Requested template name.
    pub template_name: &'a str,
}

/// Cluster ids carried by a fleet alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetIds<'a> {
    /// Management cluster the record document is kept for.
    pub management_cluster_id: &'a str,
    /// Hosted cluster the service log is sent to.
    pub hosted_cluster_id: &'a str,
}

fn required_label<'a>(alert: &'a Alert, name: &'static str) -> Result<&'a str, MatchError> {
    match alert.label(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(MatchError::MissingLabel(name)),
    }
}

/// Checks the labels every actionable alert carries.
pub fn validate_alert(alert: &Alert) -> Result<ValidAlert<'_>, MatchError> {
    let alert_name = required_label(alert, LABEL_ALERT_NAME)?;
    let template_name = required_label(alert, LABEL_TEMPLATE_NAME)?;

    match alert.label(LABEL_SEND_NOTIFICATION) {
        Some(SEND_NOTIFICATION_ENABLED) => Ok(ValidAlert { alert_name, template_name }),
        _ => Err(MatchError::NotActionable),
    }
}

/// Extracts the management and hosted cluster ids of a fleet alert.
pub fn fleet_ids(alert: &Alert) -> Result<FleetIds<'_>, MatchError> {
    Ok(FleetIds {
        management_cluster_id: required_label(alert, LABEL_MANAGEMENT_CLUSTER_ID)?,
        hosted_cluster_id: required_label(alert, LABEL_HOSTED_CLUSTER_ID)?,
    })
}

/// Finds the first document defining the named template.
///
/// Returns the document together with the template so the caller can update
/// the record kept next to it.
pub fn find_notification<'a>(
    documents: &'a [Versioned<ManagedNotification>],
    template_name: &str,
) -> Result<(&'a Versioned<ManagedNotification>, &'a Notification), MatchError> {
    documents
        .iter()
        .find_map(|doc| doc.value.notification(template_name).map(|n| (doc, n)))
        .ok_or_else(|| MatchError::TemplateNotFound(template_name.to_string()))
}
