//! HTTP delivery of service logs to the OCM service log API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ClusterRef, NotificationError, ServiceLog, ServiceLogSender};
use crate::config::OcmConfig;

/// Path of the cluster log collection.
const SERVICE_LOG_PATH: &str = "/api/service_logs/v1/cluster_logs";

/// Service name every service log is filed under.
const SERVICE_NAME: &str = "SREManualAction";

/// Summary prefix of a firing service log.
const ACTIVE_PREFIX: &str = "Action required";

/// Summary prefix of a resolved service log.
const RESOLVED_PREFIX: &str = "Issue resolved";

/// Response header carrying the API operation id.
const OPERATION_ID_HEADER: &str = "X-Operation-Id";

/// The body posted to the cluster log collection.
#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    #[serde(flatten)]
    cluster: &'a ClusterRef,
    service_name: &'static str,
    summary: String,
    description: &'a str,
    severity: &'a str,
    log_type: &'a str,
    internal_only: bool,
    doc_references: &'a [String],
}

impl<'a> From<&'a ServiceLog> for LogEntry<'a> {
    fn from(service_log: &'a ServiceLog) -> Self {
        let (prefix, description) = if service_log.is_firing {
            (ACTIVE_PREFIX, service_log.active_description.as_str())
        } else {
            (RESOLVED_PREFIX, service_log.resolved_description.as_str())
        };

        Self {
            cluster: &service_log.cluster,
            service_name: SERVICE_NAME,
            summary: format!("{}: {}", prefix, service_log.summary),
            description,
            severity: &service_log.severity,
            log_type: &service_log.log_type,
            internal_only: false,
            doc_references: &service_log.references,
        }
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reason: String,
}

/// Interprets the answer of the service log API.
///
/// Only `201 Created` means the service log exists; every other status,
/// including `200 OK`, is a failure.
pub fn response_checker(operation_id: &str, status: u16, body: &[u8]) -> Result<(), NotificationError> {
    if status == 201 {
        return Ok(());
    }

    let reason = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) if !parsed.reason.is_empty() => parsed.reason,
        _ => String::from_utf8_lossy(body).into_owned(),
    };

    Err(NotificationError::UnexpectedResponse {
        operation_id: operation_id.to_string(),
        status,
        reason,
    })
}

/// Sends service logs through a retrying HTTP client.
pub struct OcmClient {
    client: Arc<ClientWithMiddleware>,
    endpoint: Url,
    token: Option<String>,
}

impl OcmClient {
    /// Creates a client for the API configured in `config`.
    pub fn new(
        config: &OcmConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        let endpoint = Self::endpoint_for(config)?;

        if config.token.is_none() {
            tracing::warn!("No OCM token configured, service logs are sent unauthenticated.");
        }

        Ok(Self { client, endpoint, token: config.token.clone() })
    }

    /// Resolves the service log endpoint of the configured API.
    pub fn endpoint_for(config: &OcmConfig) -> Result<Url, NotificationError> {
        Url::parse(&config.base_url).and_then(|base| base.join(SERVICE_LOG_PATH)).map_err(|e| {
            NotificationError::ConfigError(format!("Invalid OCM base URL '{}': {e}", config.base_url))
        })
    }

    /// The URL service logs are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ServiceLogSender for OcmClient {
    #[tracing::instrument(skip_all, fields(cluster = service_log.cluster.id(), is_firing = service_log.is_firing))]
    async fn send_service_log(&self, service_log: &ServiceLog) -> Result<(), NotificationError> {
        let entry = LogEntry::from(service_log);

        let mut request = self.client.post(self.endpoint.clone()).json(&entry);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let operation_id = response
            .headers()
            .get(OPERATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?;

        response_checker(&operation_id, status, &body)?;

        tracing::debug!(operation_id, "Service log created.");
        Ok(())
    }
}
