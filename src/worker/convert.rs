//! Conversion worker client
//!
//! The conversion worker transcodes images referenced by the freshly
//! imported rows. It is a best-effort enhancement: the orchestrator records
//! its outcome in the run report but never fails a run because of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::import::WorkerError;
use crate::config::ConversionConfig;

/// Scope filter bounding a conversion pass to the rows of one import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionScope {
    /// Source the just-finished run imported from
    pub source_url: String,
}

/// Tally returned by the conversion worker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Items converted successfully
    pub converted: u64,
    /// Items that failed conversion
    pub failed: u64,
    /// Per-item failure descriptions (bounded by the worker)
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Client port for the conversion worker
#[async_trait]
pub trait ConversionWorker: Send + Sync {
    /// Convert all pending images within `scope`. Errors are downgraded by
    /// the orchestrator to a degraded-but-completed run.
    async fn invoke(&self, scope: &ConversionScope) -> Result<ConversionResult, WorkerError>;
}

/// Wire request for the HTTP conversion worker
#[derive(Debug, Serialize)]
struct ConvertRequest<'a> {
    scope_filter: &'a str,
}

/// HTTP implementation of the conversion worker port
pub struct HttpConversionWorker {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpConversionWorker {
    /// Build a client with the configured conversion timeout.
    pub fn new(config: &ConversionConfig) -> anyhow::Result<Self> {
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
impl ConversionWorker for HttpConversionWorker {
    async fn invoke(&self, scope: &ConversionScope) -> Result<ConversionResult, WorkerError> {
        debug!("Invoking conversion worker: scope={}", scope.source_url);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ConvertRequest {
                scope_filter: &scope.source_url,
            })
            .send()
            .await
            .map_err(|e| WorkerError::SourceUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::DestinationWriteError(format!(
                "conversion worker returned {}: {}",
                status, body
            )));
        }

        response
            .json::<ConversionResult>()
            .await
            .map_err(|e| {
                WorkerError::DestinationWriteError(format!("invalid conversion response: {}", e))
            })
    }
}
