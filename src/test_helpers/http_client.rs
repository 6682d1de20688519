use std::sync::Arc;

use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;

use crate::{config::HttpRetryConfig, http_client::create_retryable_http_client};

/// Creates an HTTP client that does not retry, so failure answers reach the
/// caller immediately.
pub fn create_test_http_client() -> Arc<ClientWithMiddleware> {
    let retry_config = HttpRetryConfig { max_retries: 0, ..Default::default() };
    Arc::new(create_retryable_http_client(&retry_config, Client::new()))
}
