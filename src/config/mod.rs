//! Configuration for ingestd

mod http;
mod import;
mod logging;

pub use http::HttpConfig;
pub use import::{ConversionConfig, ImportConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Node-level configuration (data directory and identity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the schedule record and any local state
    pub data_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ingestd"),
        }
    }
}

/// Main configuration for the ingestd daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node configuration
    #[serde(default)]
    pub node: NodeConfig,
    /// Import phase configuration
    #[serde(default)]
    pub import: ImportConfig,
    /// Conversion phase configuration
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// HTTP trigger API configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            import: ImportConfig::default(),
            conversion: ConversionConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass rather than playing whack-a-mole.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Import validation
        if self.import.max_chunks == 0 {
            errors.push("import max_chunks must be positive".to_string());
        }
        if self.import.max_chunks > 10_000 {
            errors.push("import max_chunks must be <= 10000".to_string());
        }
        if self.import.request_timeout_secs == 0 {
            errors.push("import request_timeout_secs must be positive".to_string());
        }
        if self.import.stale_run_timeout_secs == 0 {
            errors.push("import stale_run_timeout_secs must be positive".to_string());
        }
        if self.import.worker_endpoint.is_empty() {
            errors.push("import worker_endpoint must not be empty".to_string());
        }

        // Conversion validation
        if self.conversion.request_timeout_secs == 0 {
            errors.push("conversion request_timeout_secs must be positive".to_string());
        }
        if self.conversion.max_reported_errors == 0 {
            errors.push("conversion max_reported_errors must be positive".to_string());
        }

        // HTTP config validation
        if self.http.enabled && !self.http.listen_addr.is_empty() {
            // Extract port from listen_addr (format: "host:port")
            if let Some(port_str) = self.http.listen_addr.rsplit(':').next() {
                if let Ok(port) = port_str.parse::<u32>() {
                    if port == 0 || port > 65535 {
                        errors.push(format!(
                            "HTTP listen port must be between 1 and 65535, got {}",
                            port
                        ));
                    }
                }
            }
        }

        // Node validation
        if self.node.data_dir.as_os_str().is_empty() {
            errors.push("data_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn default_config_passes_validation() {
        let cfg = valid_config();
        assert!(cfg.validate().is_ok(), "default config should be valid");
    }

    #[test]
    fn validate_rejects_zero_max_chunks() {
        let mut cfg = valid_config();
        cfg.import.max_chunks = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_chunks must be positive"));
    }

    #[test]
    fn validate_rejects_oversized_max_chunks() {
        let mut cfg = valid_config();
        cfg.import.max_chunks = 20_000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_chunks must be <= 10000"));
    }

    #[test]
    fn validate_rejects_empty_worker_endpoint() {
        let mut cfg = valid_config();
        cfg.import.worker_endpoint = String::new();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("worker_endpoint must not be empty"));
    }

    #[test]
    fn validate_rejects_zero_stale_run_timeout() {
        let mut cfg = valid_config();
        cfg.import.stale_run_timeout_secs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("stale_run_timeout_secs must be positive"));
    }

    #[test]
    fn validate_rejects_http_port_zero() {
        let mut cfg = valid_config();
        cfg.http.enabled = true;
        cfg.http.listen_addr = "0.0.0.0:0".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("HTTP listen port must be between 1 and 65535"));
    }

    #[test]
    fn validate_skips_http_port_check_when_disabled() {
        let mut cfg = valid_config();
        cfg.http.enabled = false;
        cfg.http.listen_addr = "0.0.0.0:0".to_string();
        // Port validation is only performed when HTTP is enabled
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_data_dir() {
        let mut cfg = valid_config();
        cfg.node.data_dir = PathBuf::from("");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("data_dir must not be empty"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = valid_config();
        cfg.import.max_chunks = 0;
        cfg.conversion.request_timeout_secs = 0;
        cfg.node.data_dir = PathBuf::from("");
        let err = cfg.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("max_chunks must be positive"));
        assert!(msg.contains("conversion request_timeout_secs must be positive"));
        assert!(msg.contains("data_dir must not be empty"));
    }

    #[test]
    fn default_import_config_values() {
        let imp = ImportConfig::default();
        assert_eq!(imp.max_chunks, 100);
        assert_eq!(imp.chunk_delay_ms, 1000);
        assert_eq!(imp.request_timeout_secs, 60);
        assert_eq!(imp.stale_run_timeout_secs, 3600);
    }

    #[test]
    fn default_conversion_config_values() {
        let conv = ConversionConfig::default();
        assert_eq!(conv.request_timeout_secs, 300);
        assert_eq!(conv.max_reported_errors, 10);
    }

    #[test]
    fn default_http_config_values() {
        let h = HttpConfig::default();
        assert!(!h.enabled);
        assert_eq!(h.listen_addr, "127.0.0.1:8710");
        assert!(h.api_keys.is_empty());
        assert!(!h.cors_enabled);
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let cfg = valid_config();
        let text = toml::to_string(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.import.max_chunks, cfg.import.max_chunks);
    }
}
