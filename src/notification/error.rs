//! Error types for the service log delivery path.

use std::time::Duration;

use thiserror::Error;

use crate::{http_client::HttpClientPoolError, notification::template::TemplateServiceError};

/// Why a service log could not be delivered.
///
/// Every variant leaves the delivery record untouched, so the next alert
/// retries the send.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The `ocm` settings are unusable, e.g. a malformed base URL.
    #[error("Invalid service log client settings: {0}")]
    ConfigError(String),

    /// The service log API answered with anything but `201 Created`.
    #[error("Service log API rejected the request (operation id '{operation_id}', status {status}): {reason}")]
    UnexpectedResponse {
        /// Operation id reported by the API, empty when absent.
        operation_id: String,
        /// HTTP status code of the response.
        status: u16,
        /// Reason reported in the response body, or the raw body.
        reason: String,
    },

    /// The send did not complete within the configured time.
    #[error("Sending the service log timed out after {0:?}")]
    Timeout(Duration),

    /// The send was abandoned because the relay is shutting down.
    #[error("Sending the service log was interrupted by shutdown")]
    Cancelled,

    /// The pooled HTTP client could not be built.
    #[error(transparent)]
    HttpClientError(#[from] HttpClientPoolError),

    /// Transport failure that outlived the retry policy.
    #[error("Service log request failed: {0}")]
    RequestError(#[from] reqwest_middleware::Error),

    /// A summary or description template failed to render.
    #[error("Could not render the service log: {0}")]
    TemplateError(#[from] TemplateServiceError),
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::RequestError(reqwest_middleware::Error::Reqwest(err))
    }
}
