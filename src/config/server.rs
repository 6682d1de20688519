use serde::Deserialize;

/// Configuration of the webhook receiver server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address and port for the HTTP server to listen on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// Provides the default value for listen_address.
fn default_listen_address() -> String {
    "0.0.0.0:8081".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_address: default_listen_address() }
    }
}
