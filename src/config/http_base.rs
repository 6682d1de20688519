use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration_secs;

/// Connection settings of the pooled `reqwest` clients.
///
/// The relay talks to a single API host, so the pool stays small.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct BaseHttpClientConfig {
    /// Idle connections kept open per host.
    pub max_idle_per_host: usize,

    /// Idle connections are closed after this long.
    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,

    /// Bound for establishing a connection.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
}

impl Default for BaseHttpClientConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
