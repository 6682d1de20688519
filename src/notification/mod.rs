//! # Service log delivery
//!
//! A service log is the customer facing notification posted to the OCM
//! service log API for a cluster. This module defines what a service log
//! carries, the [`ServiceLogSender`] seam the dispatcher sends through, and
//! the HTTP implementation of that seam.
//!
//! ## Core Components
//!
//! - **`ServiceLog`**: the rendered content of one service log and the
//!   cluster it is addressed to.
//! - **`ServiceLogSender`**: the delivery trait. It reports success only when
//!   the API confirmed the service log was created.
//! - **`OcmClient`**: posts service logs to the API using a pooled, retrying
//!   HTTP client.
//! - **`TemplateService`**: renders summaries and descriptions against the
//!   labels and annotations of the alert.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

pub mod error;
mod ocm;
pub mod template;

pub use error::NotificationError;
pub use ocm::{OcmClient, response_checker};
pub use template::{TemplateService, TemplateServiceError};

/// Identifies the cluster a service log is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClusterRef {
    /// The external cluster UUID, used for a standalone cluster.
    #[serde(rename = "cluster_uuid")]
    ExternalId(String),
    /// The internal cluster id, used for hosted clusters of a fleet.
    #[serde(rename = "cluster_id")]
    InternalId(String),
}

impl ClusterRef {
    /// The id itself, whatever its kind.
    pub fn id(&self) -> &str {
        match self {
            ClusterRef::ExternalId(id) | ClusterRef::InternalId(id) => id,
        }
    }
}

/// A rendered service log ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLog {
    /// Short summary, without the firing or resolved prefix.
    pub summary: String,
    /// Description used while the alert fires.
    pub active_description: String,
    /// Description used once the alert resolves.
    pub resolved_description: String,
    /// The cluster the service log is attached to.
    pub cluster: ClusterRef,
    /// Service log severity.
    pub severity: String,
    /// Service log type.
    pub log_type: String,
    /// Documentation links.
    pub references: Vec<String>,
    /// Whether the alert fires, selecting the description and prefix used.
    pub is_firing: bool,
}

/// Delivers service logs to the operations API.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceLogSender: Send + Sync {
    /// Sends one service log. `Ok` means the API confirmed its creation.
    async fn send_service_log(&self, service_log: &ServiceLog) -> Result<(), NotificationError>;
}
