use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use tokio::sync::RwLock;

/// Name under which send failures of the service log API are tracked.
pub const SERVICE_LOGS_API: &str = "service_logs";

/// Service logs sent for one template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentCounts {
    /// Service logs sent while the alert was firing.
    pub firing: u64,
    /// Service logs sent after the alert resolved.
    pub resolved: u64,
}

/// A struct to hold application metrics.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// The time the application started.
    pub start_time: tokio::time::Instant,
    /// Consecutive failed requests per receiver path.
    pub request_failures: BTreeMap<String, u64>,
    /// Consecutive failed calls per external API.
    pub response_failures: BTreeMap<String, u64>,
    /// Service logs sent per template.
    pub service_logs_sent: BTreeMap<String, SentCounts>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            start_time: tokio::time::Instant::now(),
            request_failures: BTreeMap::new(),
            response_failures: BTreeMap::new(),
            service_logs_sent: BTreeMap::new(),
        }
    }
}

/// Shared application metrics for the HTTP server.
#[derive(Clone, Default)]
pub struct AppMetrics {
    /// Shared metrics.
    pub metrics: Arc<RwLock<Metrics>>,
}

impl AppMetrics {
    /// Counts a request to `path` that could not be handled.
    pub async fn record_request_failure(&self, path: &str) {
        *self.metrics.write().await.request_failures.entry(path.to_string()).or_default() += 1;
    }

    /// Clears the failure count of `path` after a handled request.
    pub async fn reset_request_failures(&self, path: &str) {
        self.metrics.write().await.request_failures.insert(path.to_string(), 0);
    }

    /// Counts a failed call to an external API.
    pub async fn record_response_failure(&self, api: &str) {
        *self.metrics.write().await.response_failures.entry(api.to_string()).or_default() += 1;
    }

    /// Clears the failure count of an external API after a successful call.
    pub async fn reset_response_failures(&self, api: &str) {
        self.metrics.write().await.response_failures.insert(api.to_string(), 0);
    }

    /// Counts a service log sent for `template`.
    pub async fn count_service_log_sent(&self, template: &str, is_firing: bool) {
        let mut metrics = self.metrics.write().await;
        let counts = metrics.service_logs_sent.entry(template.to_string()).or_default();
        if is_firing {
            counts.firing += 1;
        } else {
            counts.resolved += 1;
        }
    }

    /// Returns a copy of the current values.
    pub async fn snapshot(&self) -> Metrics {
        self.metrics.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_failures_reset_on_success() {
        let metrics = AppMetrics::default();

        metrics.record_request_failure("/alertmanager-receiver").await;
        metrics.record_request_failure("/alertmanager-receiver").await;
        assert_eq!(metrics.snapshot().await.request_failures["/alertmanager-receiver"], 2);

        metrics.reset_request_failures("/alertmanager-receiver").await;
        assert_eq!(metrics.snapshot().await.request_failures["/alertmanager-receiver"], 0);
    }

    #[tokio::test]
    async fn test_response_failures_are_tracked_per_api() {
        let metrics = AppMetrics::default();

        metrics.record_response_failure(SERVICE_LOGS_API).await;
        metrics.reset_response_failures("other").await;

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.response_failures[SERVICE_LOGS_API], 1);
        assert_eq!(snapshot.response_failures["other"], 0);
    }

    #[tokio::test]
    async fn test_service_logs_counted_by_state() {
        let metrics = AppMetrics::default();

        metrics.count_service_log_sent("volume-filling-up", true).await;
        metrics.count_service_log_sent("volume-filling-up", true).await;
        metrics.count_service_log_sent("volume-filling-up", false).await;

        let snapshot = metrics.snapshot().await;
        assert_eq!(
            snapshot.service_logs_sent["volume-filling-up"],
            SentCounts { firing: 2, resolved: 1 }
        );
    }
}
