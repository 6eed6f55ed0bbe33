//! Phase orchestrator
//!
//! Sequences one run: run guard acquisition, the chunked import phase, the
//! optional conversion phase, and completion with the next scheduled run
//! time. The schedule record is the state holder; every path out of a run
//! persists a terminal status.

mod chunk_loop;
mod report;

pub use report::{ConversionSummary, RunReport};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::schedule::{
    next_occurrence, AcquireOutcome, ScheduleStatus, ScheduleStore, StoreError,
};
use crate::worker::{
    ConversionScope, ConversionWorker, HttpConversionWorker, HttpImportWorker, ImportWorker,
};

use chunk_loop::{ChunkLoop, ImportOutcome, ImportTotals};

/// Errors from the trigger entry point
#[derive(Debug, Error)]
pub enum RunError {
    /// Another run holds the schedule; callers should treat this as a no-op
    #[error("a run is already in progress for this schedule")]
    AlreadyRunning,

    /// The schedule is administratively disabled
    #[error("the schedule is disabled")]
    Disabled,

    /// The schedule record could not be read or written
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives one schedule through import, conversion, and completion
pub struct Orchestrator {
    store: Arc<ScheduleStore>,
    import_worker: Arc<dyn ImportWorker>,
    conversion_worker: Arc<dyn ConversionWorker>,
    max_chunks: usize,
    chunk_delay: Duration,
    stale_after: chrono::Duration,
    max_reported_errors: usize,
}

impl Orchestrator {
    /// Create an orchestrator over the given store and worker clients.
    pub fn new(
        store: Arc<ScheduleStore>,
        import_worker: Arc<dyn ImportWorker>,
        conversion_worker: Arc<dyn ConversionWorker>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            import_worker,
            conversion_worker,
            max_chunks: config.import.max_chunks,
            chunk_delay: Duration::from_millis(config.import.chunk_delay_ms),
            stale_after: chrono::Duration::seconds(config.import.stale_run_timeout_secs as i64),
            max_reported_errors: config.conversion.max_reported_errors,
        }
    }

    /// Create an orchestrator wired to the configured HTTP workers.
    pub fn with_http_workers(store: Arc<ScheduleStore>, config: &Config) -> anyhow::Result<Self> {
        let import_worker = Arc::new(HttpImportWorker::new(&config.import)?);
        let conversion_worker = Arc::new(HttpConversionWorker::new(&config.conversion)?);
        Ok(Self::new(store, import_worker, conversion_worker, config))
    }

    /// Trigger entry point: run the schedule now.
    ///
    /// Returns a report for runs that reached a terminal state (including
    /// failed ones — the failure lives in the report). `AlreadyRunning` and
    /// `Disabled` reject the trigger without starting a run.
    pub async fn run_now(&self) -> Result<RunReport, RunError> {
        let now = Utc::now();
        let state = match self.store.try_acquire(now, self.stale_after)? {
            AcquireOutcome::Acquired(state) => state,
            AcquireOutcome::AlreadyRunning => return Err(RunError::AlreadyRunning),
            AcquireOutcome::Disabled => return Err(RunError::Disabled),
        };

        info!(
            "Run started: schedule={}, source={}, offset={}",
            state.id, state.source_url, state.current_offset
        );

        let loop_ = ChunkLoop {
            store: self.store.as_ref(),
            worker: self.import_worker.as_ref(),
            max_chunks: self.max_chunks,
            chunk_delay: self.chunk_delay,
        };

        let (outcome, revision) = match loop_.run(&state).await {
            Ok(result) => result,
            Err(e) => {
                self.mark_failed_best_effort(&e);
                return Err(e.into());
            }
        };

        match outcome {
            ImportOutcome::Exhausted { totals } => {
                self.finish_completed(&state, revision, totals).await
            }
            ImportOutcome::ChunkFailed {
                totals,
                chunk_index,
                error,
            } => {
                let message = format!("chunk {} failed: {}", chunk_index, error);
                warn!("Run failed: {}", message);
                // The offset keeps the last successful checkpoint so the
                // next run resumes at the failure boundary.
                let updated = self.store.update(revision, |s| {
                    s.status = ScheduleStatus::Failed;
                    s.error_message = Some(message.clone());
                })?;
                Ok(failed_report(totals, updated.total_rows, message))
            }
            ImportOutcome::SafetyLimitExceeded { totals } => {
                let message = format!(
                    "import aborted: safety limit of {} chunks reached without exhausting the source",
                    self.max_chunks
                );
                warn!("Run failed: {}", message);
                // A cursor that never converges is not worth resuming into.
                let updated = self.store.update(revision, |s| {
                    s.status = ScheduleStatus::Failed;
                    s.current_offset = 0;
                    s.error_message = Some(message.clone());
                })?;
                Ok(failed_report(totals, updated.total_rows, message))
            }
        }
    }

    /// Conversion phase plus completion bookkeeping after a fully exhausted
    /// import.
    async fn finish_completed(
        &self,
        state: &crate::schedule::ScheduleState,
        revision: u64,
        totals: ImportTotals,
    ) -> Result<RunReport, RunError> {
        let mut revision = revision;

        let conversion = if state.auto_convert_images {
            let updated = self
                .store
                .update(revision, |s| s.status = ScheduleStatus::Converting)?;
            revision = updated.revision;
            Some(self.run_conversion(&state.source_url).await)
        } else {
            None
        };

        let now = Utc::now();
        let next_run = next_occurrence(state.scheduled_time, now);
        let updated = self.store.update(revision, |s| {
            s.status = ScheduleStatus::Completed;
            s.current_offset = 0;
            s.next_run_at = Some(next_run);
            s.error_message = None;
        })?;

        info!(
            "Run completed: {} chunks, {} inserted, {} updated, next run at {}",
            totals.chunks_processed, totals.records_inserted, totals.records_updated, next_run
        );

        Ok(RunReport {
            status: ScheduleStatus::Completed,
            chunks_processed: totals.chunks_processed,
            records_inserted: totals.records_inserted,
            records_updated: totals.records_updated,
            total_rows: updated.total_rows,
            conversion,
            next_run_at: Some(next_run),
            error: None,
        })
    }

    /// Invoke the conversion worker; failures degrade the summary, never the
    /// run.
    async fn run_conversion(&self, source_url: &str) -> ConversionSummary {
        let scope = ConversionScope {
            source_url: source_url.to_string(),
        };
        match self.conversion_worker.invoke(&scope).await {
            Ok(mut result) => {
                result.errors.truncate(self.max_reported_errors);
                let degraded = result.failed > 0 || !result.errors.is_empty();
                if degraded {
                    warn!(
                        "Conversion degraded: {} converted, {} failed",
                        result.converted, result.failed
                    );
                } else {
                    info!("Conversion completed: {} converted", result.converted);
                }
                ConversionSummary {
                    converted: result.converted,
                    failed: result.failed,
                    errors: result.errors,
                    degraded,
                }
            }
            Err(e) => {
                warn!("Conversion worker failed (non-fatal): {}", e);
                ConversionSummary {
                    converted: 0,
                    failed: 0,
                    errors: vec![e.to_string()],
                    degraded: true,
                }
            }
        }
    }

    /// Last-resort attempt to leave a terminal status behind when the store
    /// itself failed mid-run. A revision conflict means something else owns
    /// the record now, so it is left alone.
    fn mark_failed_best_effort(&self, cause: &StoreError) {
        if matches!(cause, StoreError::RevisionConflict { .. }) {
            warn!("Schedule record changed under the run; leaving it untouched: {}", cause);
            return;
        }
        let revision = self.store.snapshot().revision;
        let message = format!("run aborted: {}", cause);
        if let Err(e) = self.store.update(revision, |s| {
            s.status = ScheduleStatus::Failed;
            s.error_message = Some(message.clone());
        }) {
            warn!("Could not persist failed status after store error: {}", e);
        }
    }
}

fn failed_report(totals: ImportTotals, total_rows: Option<u64>, message: String) -> RunReport {
    RunReport {
        status: ScheduleStatus::Failed,
        chunks_processed: totals.chunks_processed,
        records_inserted: totals.records_inserted,
        records_updated: totals.records_updated,
        total_rows,
        conversion: None,
        next_run_at: None,
        error: Some(message),
    }
}
