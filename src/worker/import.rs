//! Import worker client
//!
//! The import worker parses and upserts one chunk of source rows per call.
//! Calls are safe to repeat with the same offset: the destination applies
//! idempotent upsert semantics, so a replayed chunk changes nothing beyond
//! the counters it reports.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ImportConfig;

/// Errors from a single worker invocation
#[derive(Debug, Clone, Error)]
pub enum WorkerError {
    /// The source dataset could not be reached (network failure, timeout,
    /// gateway errors)
    #[error("source unreachable: {0}")]
    SourceUnreachable(String),

    /// The source returned a record the worker could not parse
    #[error("malformed record at offset {offset}: {message}")]
    MalformedRecord { offset: u64, message: String },

    /// The worker failed to write to the destination store
    #[error("destination write failed: {0}")]
    DestinationWriteError(String),
}

/// Result of one import worker invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Rows inserted by this chunk
    pub records_inserted: u64,
    /// Rows updated by this chunk
    pub records_updated: u64,
    /// Whether more chunks remain after this one
    pub has_more: bool,
    /// Cursor for the next chunk; meaningful only when `has_more`
    #[serde(default)]
    pub next_offset: u64,
    /// Best current estimate of the dataset size, if the worker knows it
    #[serde(default)]
    pub total_rows: Option<u64>,
}

/// Client port for the import worker
#[async_trait]
pub trait ImportWorker: Send + Sync {
    /// Process one chunk of the source dataset starting at `offset`.
    async fn invoke(&self, source_url: &str, offset: u64) -> Result<ChunkResult, WorkerError>;
}

/// Wire request for the HTTP import worker
#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    source_location: &'a str,
    offset: u64,
}

/// HTTP implementation of the import worker port
pub struct HttpImportWorker {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpImportWorker {
    /// Build a client with the configured per-chunk timeout.
    pub fn new(config: &ImportConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.worker_endpoint.clone(),
        })
    }
}

#[async_trait]
impl ImportWorker for HttpImportWorker {
    async fn invoke(&self, source_url: &str, offset: u64) -> Result<ChunkResult, WorkerError> {
        debug!("Invoking import worker: offset={}", offset);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ImportRequest {
                source_location: source_url,
                offset,
            })
            .send()
            .await
            .map_err(|e| WorkerError::SourceUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, offset, &body));
        }

        response
            .json::<ChunkResult>()
            .await
            .map_err(|e| WorkerError::DestinationWriteError(format!("invalid chunk response: {}", e)))
    }
}

/// Map a non-success HTTP status to the worker error taxonomy.
fn classify_status(status: StatusCode, offset: u64, body: &str) -> WorkerError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    };
    match status {
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => WorkerError::SourceUnreachable(message),
        s if s.is_client_error() => WorkerError::MalformedRecord { offset, message },
        _ => WorkerError::DestinationWriteError(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_map_to_source_unreachable() {
        for status in [
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::GATEWAY_TIMEOUT,
        ] {
            assert!(matches!(
                classify_status(status, 0, ""),
                WorkerError::SourceUnreachable(_)
            ));
        }
    }

    #[test]
    fn client_errors_map_to_malformed_record_with_offset() {
        match classify_status(StatusCode::UNPROCESSABLE_ENTITY, 400, "bad row") {
            WorkerError::MalformedRecord { offset, message } => {
                assert_eq!(offset, 400);
                assert!(message.contains("bad row"));
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn server_errors_map_to_destination_write_error() {
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, 0, "disk full"),
            WorkerError::DestinationWriteError(_)
        ));
    }

    #[test]
    fn chunk_result_accepts_missing_optional_fields() {
        let parsed: ChunkResult = serde_json::from_str(
            r#"{"records_inserted": 200, "records_updated": 0, "has_more": false}"#,
        )
        .unwrap();
        assert_eq!(parsed.records_inserted, 200);
        assert!(!parsed.has_more);
        assert_eq!(parsed.next_offset, 0);
        assert!(parsed.total_rows.is_none());
    }
}
