//! Run report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::ScheduleStatus;

/// Summary of the conversion phase, mirrored into the run report only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSummary {
    /// Items converted successfully
    pub converted: u64,
    /// Items that failed conversion
    pub failed: u64,
    /// Bounded list of per-item failure descriptions
    pub errors: Vec<String>,
    /// Whether the phase fell short of a clean pass (failures, errors, or a
    /// worker-level fault). Degradation never fails the run.
    pub degraded: bool,
}

/// The value produced at the end of one orchestrator invocation.
///
/// Not persisted as its own entity; surfaced to the caller and mirrored into
/// the schedule record's status/error/next-run fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Terminal status of the run (`completed` or `failed`)
    pub status: ScheduleStatus,
    /// Chunks processed by the import phase
    pub chunks_processed: usize,
    /// Rows inserted across all chunks
    pub records_inserted: u64,
    /// Rows updated across all chunks
    pub records_updated: u64,
    /// Dataset size, if the import worker reported it
    pub total_rows: Option<u64>,
    /// Conversion summary, present only when the conversion phase ran
    pub conversion: Option<ConversionSummary>,
    /// Computed next scheduled run time (set on completion)
    pub next_run_at: Option<DateTime<Utc>>,
    /// Terminal error of a failed run
    pub error: Option<String>,
}
