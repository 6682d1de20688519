//! This module provides a retryable HTTP client and a pool for sharing
//! clients across the application.

mod client;
mod pool;

pub use client::create_retryable_http_client;
pub use pool::{HttpClientPool, HttpClientPoolError};
