//! HTTP trigger API configuration

use serde::{Deserialize, Serialize};

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Enable the HTTP trigger API
    pub enabled: bool,
    /// Listen address (e.g., "0.0.0.0:8710")
    pub listen_addr: String,
    /// API keys for authentication (empty = no auth required)
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// Enable CORS (useful for browser-based dashboards)
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1:8710".to_string(),
            api_keys: Vec::new(),
            cors_enabled: false,
        }
    }
}
