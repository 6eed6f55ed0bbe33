//! Chunk loop controller
//!
//! Drives repeated import worker invocations until the source is exhausted
//! or the safety bound is hit, persisting the offset checkpoint after every
//! chunk so a crash loses at most one chunk of work. Chunk i+1 is never
//! invoked before chunk i's result is durable.

use std::time::Duration;

use tracing::{debug, info};

use crate::schedule::{ScheduleState, ScheduleStatus, ScheduleStore, StoreError};
use crate::worker::{ImportWorker, WorkerError};

/// Run-level accumulators for the import phase
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ImportTotals {
    pub chunks_processed: usize,
    pub records_inserted: u64,
    pub records_updated: u64,
}

/// How the import phase ended
#[derive(Debug)]
pub(crate) enum ImportOutcome {
    /// The source reported `has_more = false`
    Exhausted { totals: ImportTotals },
    /// A chunk invocation failed; the loop aborted immediately
    ChunkFailed {
        totals: ImportTotals,
        chunk_index: usize,
        error: WorkerError,
    },
    /// The safety bound was reached without exhausting the source
    SafetyLimitExceeded { totals: ImportTotals },
}

/// The chunk loop over one schedule's source
pub(crate) struct ChunkLoop<'a> {
    pub store: &'a ScheduleStore,
    pub worker: &'a dyn ImportWorker,
    pub max_chunks: usize,
    pub chunk_delay: Duration,
}

impl ChunkLoop<'_> {
    /// Run the import phase starting from the schedule's persisted offset.
    ///
    /// Returns the outcome together with the latest record revision, so the
    /// caller can continue mutating the record. Worker failures are part of
    /// the outcome; only store failures surface as errors.
    pub(crate) async fn run(
        &self,
        state: &ScheduleState,
    ) -> Result<(ImportOutcome, u64), StoreError> {
        let mut offset = state.current_offset;
        let mut totals = ImportTotals::default();

        // Enter the importing phase with the starting cursor on disk.
        let updated = self.store.update(state.revision, |s| {
            s.status = ScheduleStatus::Importing;
            s.current_offset = offset;
        })?;
        let mut revision = updated.revision;

        info!(
            "Import phase started: source={}, offset={}, max_chunks={}",
            state.source_url, offset, self.max_chunks
        );

        loop {
            let chunk_index = totals.chunks_processed + 1;
            if chunk_index > self.max_chunks {
                return Ok((ImportOutcome::SafetyLimitExceeded { totals }, revision));
            }

            let chunk = match self.worker.invoke(&state.source_url, offset).await {
                Ok(chunk) => chunk,
                Err(error) => {
                    return Ok((
                        ImportOutcome::ChunkFailed {
                            totals,
                            chunk_index,
                            error,
                        },
                        revision,
                    ));
                }
            };

            totals.chunks_processed += 1;
            totals.records_inserted += chunk.records_inserted;
            totals.records_updated += chunk.records_updated;
            let total_rows = chunk.total_rows;

            debug!(
                "Chunk {} done: +{} inserted, +{} updated, has_more={}",
                chunk_index, chunk.records_inserted, chunk.records_updated, chunk.has_more
            );

            if !chunk.has_more {
                if total_rows.is_some() {
                    let updated = self.store.update(revision, |s| s.total_rows = total_rows)?;
                    revision = updated.revision;
                }
                info!(
                    "Import phase exhausted source after {} chunks ({} inserted, {} updated)",
                    totals.chunks_processed, totals.records_inserted, totals.records_updated
                );
                return Ok((ImportOutcome::Exhausted { totals }, revision));
            }

            // Durable checkpoint before the inter-chunk delay and the next
            // invocation; on a crash the next run resumes here.
            offset = chunk.next_offset;
            let updated = self.store.update(revision, |s| {
                s.current_offset = offset;
                if total_rows.is_some() {
                    s.total_rows = total_rows;
                }
            })?;
            revision = updated.revision;

            tokio::time::sleep(self.chunk_delay).await;
        }
    }
}
