//! Import and conversion phase configuration

use serde::{Deserialize, Serialize};

/// Import phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Endpoint of the import worker invoked once per chunk
    pub worker_endpoint: String,
    /// Hard maximum chunk count per run (safety bound against runaway sources)
    pub max_chunks: usize,
    /// Fixed delay between chunks in milliseconds, bounding load on both sides
    pub chunk_delay_ms: u64,
    /// Per-chunk request timeout in seconds
    pub request_timeout_secs: u64,
    /// Age in seconds after which an in-progress run is considered abandoned
    /// by a crashed process and may be reclaimed
    pub stale_run_timeout_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            worker_endpoint: "http://127.0.0.1:8711/import".to_string(),
            max_chunks: 100,
            chunk_delay_ms: 1000,
            request_timeout_secs: 60,
            stale_run_timeout_secs: 3600,
        }
    }
}

/// Conversion phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Endpoint of the conversion worker invoked once per run
    pub worker_endpoint: String,
    /// Request timeout in seconds; a timeout degrades the run report, it
    /// never fails the run
    pub request_timeout_secs: u64,
    /// Bound on the per-item failure descriptions kept in the run report
    pub max_reported_errors: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            worker_endpoint: "http://127.0.0.1:8712/convert".to_string(),
            request_timeout_secs: 300,
            max_reported_errors: 10,
        }
    }
}
