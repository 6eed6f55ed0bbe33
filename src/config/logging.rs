//! Log output settings
//!
//! ingestd logs through `tracing`; these settings pick the subscriber's
//! format and base level. Json output is meant for log shippers, text for a
//! terminal. `-v`/`-vv` on the command line override the configured level.

use serde::{Deserialize, Serialize};

/// Subscriber output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Base log level when no verbosity flags are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The tracing level this setting maps to.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format
    #[serde(default = "default_format")]
    pub format: LogFormat,
    /// Base log level
    #[serde(default = "default_level")]
    pub level: LogLevel,
}

fn default_format() -> LogFormat {
    LogFormat::Text
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            level: default_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_text_at_info() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.format, LogFormat::Text);
        assert_eq!(cfg.level, LogLevel::Info);
    }

    #[test]
    fn settings_parse_as_lowercase_strings() {
        let cfg: LoggingConfig = toml::from_str("format = \"json\"\nlevel = \"warn\"").unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.level, LogLevel::Warn);
    }

    #[test]
    fn levels_map_onto_tracing() {
        assert_eq!(LogLevel::Trace.as_tracing(), tracing::Level::TRACE);
        assert_eq!(LogLevel::Info.as_tracing(), tracing::Level::INFO);
        assert_eq!(LogLevel::Error.as_tracing(), tracing::Level::ERROR);
    }
}
