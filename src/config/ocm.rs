use std::time::Duration;

use serde::Deserialize;

use super::duration_secs;

/// Environment variable the API token is read from when the configuration
/// file does not set one.
const TOKEN_ENV_VAR: &str = "RELAY_OCM_TOKEN";

fn default_base_url() -> String {
    "https://api.openshift.com".to_string()
}

fn default_token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty())
}

fn default_send_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Connection settings of the OCM service log API.
#[derive(Debug, Deserialize, Clone)]
pub struct OcmConfig {
    /// Base URL of the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request.
    /// If not set in config, falls back to the `RELAY_OCM_TOKEN` env var.
    #[serde(default = "default_token_from_env")]
    pub token: Option<String>,

    /// Upper bound for a single send, retries included.
    #[serde(
        rename = "send_timeout_secs",
        default = "default_send_timeout",
        with = "duration_secs"
    )]
    pub send_timeout: Duration,
}

impl Default for OcmConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), token: None, send_timeout: default_send_timeout() }
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_ocm_config_from_yaml() {
        let yaml = r#"
          base_url: "http://ocm.local:8000"
          token: "abc"
          send_timeout_secs: 5
        "#;
        let config = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<OcmConfig>()
            .unwrap();

        assert_eq!(config.base_url, "http://ocm.local:8000");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_ocm_config_defaults() {
        let config = OcmConfig::default();
        assert_eq!(config.base_url, "https://api.openshift.com");
        assert_eq!(config.send_timeout, Duration::from_secs(30));
    }
}
