//! Construction of HTTP clients that retry transient failures.
//!
//! The service log `POST` is not idempotent. When the API stores a service
//! log and then times out or answers `5xx`, the retry posts it again and the
//! customer sees it twice. Losing a service log on a short outage is the
//! worse outcome here, so transient failures are retried anyway. Setting
//! `http_retry_config.max_retries` to `0` turns this into at most one post
//! per decision.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{Jitter, RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{HttpRetryConfig, JitterSetting};

/// Wraps `base_client` with a retry middleware following `config`.
///
/// Connection errors, timeouts, `429` and `5xx` answers are retried with
/// exponential backoff; every other answer is returned to the caller.
pub fn create_retryable_http_client(
    config: &HttpRetryConfig,
    base_client: reqwest::Client,
) -> ClientWithMiddleware {
    let jitter = match config.jitter {
        JitterSetting::None => Jitter::None,
        JitterSetting::Full => Jitter::Full,
    };

    let retry_policy = ExponentialBackoff::builder()
        .jitter(jitter)
        .base(config.base_for_backoff)
        .retry_bounds(config.initial_backoff_ms, config.max_backoff_secs)
        .build_with_max_retries(config.max_retries);

    ClientBuilder::new(base_client).with(RetryTransientMiddleware::new_with_policy(retry_policy)).build()
}
