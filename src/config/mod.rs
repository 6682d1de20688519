//! Configuration module for the service log relay.

mod app_config;
mod helpers;
mod http_base;
mod http_retry;
mod loader;
mod ocm;
mod server;

pub use app_config::{AppConfig, AppConfigBuilder, AppConfigError, DEFAULT_NAMESPACE};
pub use helpers::{duration_ms, duration_secs};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use loader::{ConfigLoader, LoaderError};
pub use ocm::OcmConfig;
pub use server::ServerConfig;
