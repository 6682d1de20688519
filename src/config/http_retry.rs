use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{duration_ms, duration_secs};

/// Randomization of the wait between two attempts.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JitterSetting {
    /// Wait exactly the computed backoff.
    None,
    /// Wait a random duration up to the computed backoff.
    #[default]
    Full,
}

/// Retry policy of the HTTP client used for the service log API.
///
/// Only transient failures (connection errors, timeouts, 5xx and 429) are
/// retried; a definitive answer of the API is returned as is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct HttpRetryConfig {
    /// Retries on top of the first attempt.
    pub max_retries: u32,
    /// Growth factor of the backoff between attempts.
    pub base_for_backoff: u32,
    /// Wait before the first retry.
    #[serde(with = "duration_ms")]
    pub initial_backoff_ms: Duration,
    /// Ceiling for any single wait.
    #[serde(with = "duration_secs")]
    pub max_backoff_secs: Duration,
    /// Randomization applied to every wait.
    pub jitter: JitterSetting,
}

impl Default for HttpRetryConfig {
    fn default() -> Self {
        // A service log that is a few seconds late is fine, one that is lost
        // is resent only after the next alert.
        Self {
            max_retries: 3,
            base_for_backoff: 2,
            initial_backoff_ms: Duration::from_millis(250),
            max_backoff_secs: Duration::from_secs(10),
            jitter: JitterSetting::Full,
        }
    }
}
