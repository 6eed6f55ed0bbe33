//! Schedule persistence and the run guard
//!
//! The record is stored as pretty-printed JSON so operators and dashboards
//! can read it directly. Writes go through a temp file and an atomic rename,
//! so a crash mid-write never corrupts the record.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use super::state::{ScheduleState, ScheduleStatus};

/// Schedule record file name inside the data directory
const SCHEDULE_FILE: &str = "schedule.json";

/// Errors from the schedule store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schedule store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schedule record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("no schedule record found in '{0}' (run `ingestd init` first)")]
    NotInitialized(PathBuf),

    #[error("schedule record was modified concurrently (expected revision {expected}, found {found})")]
    RevisionConflict { expected: u64, found: u64 },
}

/// Outcome of a run guard acquisition attempt
#[derive(Debug)]
pub enum AcquireOutcome {
    /// The guard was taken; the returned state is `running` with a fresh
    /// `last_run_at` stamp
    Acquired(ScheduleState),
    /// Another run holds the schedule
    AlreadyRunning,
    /// The schedule is administratively disabled
    Disabled,
}

/// Durable store for the singleton schedule record.
///
/// The in-memory copy under the mutex is authoritative; every mutation is
/// persisted before the lock is released, so the check-then-set of
/// [`ScheduleStore::try_acquire`] is a single atomic read-modify-write.
pub struct ScheduleStore {
    path: PathBuf,
    state: Mutex<ScheduleState>,
}

impl ScheduleStore {
    /// Create a new schedule record, failing if one already exists.
    pub fn create(data_dir: &Path, state: ScheduleState) -> Result<Self, StoreError> {
        let path = data_dir.join(SCHEDULE_FILE);
        if path.exists() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("schedule record already exists at {}", path.display()),
            )));
        }
        fs::create_dir_all(data_dir)?;
        write_atomic(&path, &state)?;
        info!("Created schedule record at {}", path.display());
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open an existing schedule record.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let path = data_dir.join(SCHEDULE_FILE);
        if !path.exists() {
            return Err(StoreError::NotInitialized(data_dir.to_path_buf()));
        }
        let contents = fs::read_to_string(&path)?;
        let state: ScheduleState = serde_json::from_str(&contents)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Current state of the schedule record.
    pub fn snapshot(&self) -> ScheduleState {
        self.state.lock().clone()
    }

    /// Run guard: atomically transition to `running` if the schedule is
    /// enabled and no run is active. The enabled check shares the lock with
    /// the transition, so a concurrent disable cannot slip in between.
    ///
    /// An in-progress status whose `last_run_at` is older than `stale_after`
    /// belongs to a run that died without reaching a terminal state (process
    /// crash or kill); it is reclaimed rather than blocking the schedule
    /// forever.
    pub fn try_acquire(
        &self,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<AcquireOutcome, StoreError> {
        let mut state = self.state.lock();

        if !state.enabled {
            return Ok(AcquireOutcome::Disabled);
        }

        if state.status.is_in_progress() {
            let stale = match state.last_run_at {
                Some(started) => now.signed_duration_since(started) >= stale_after,
                None => true,
            };
            if !stale {
                return Ok(AcquireOutcome::AlreadyRunning);
            }
            warn!(
                "Reclaiming schedule stuck in '{}' since {:?}; previous run presumed dead",
                state.status.as_str(),
                state.last_run_at
            );
        }

        state.status = ScheduleStatus::Running;
        state.last_run_at = Some(now);
        state.error_message = None;
        state.updated_at = now;
        state.revision += 1;
        write_atomic(&self.path, &state)?;
        Ok(AcquireOutcome::Acquired(state.clone()))
    }

    /// Apply a mutation and persist it, guarded by the revision the caller
    /// last observed. A mismatch means something mutated the record outside
    /// the current run.
    pub fn update<F>(&self, expected_revision: u64, mutate: F) -> Result<ScheduleState, StoreError>
    where
        F: FnOnce(&mut ScheduleState),
    {
        let mut state = self.state.lock();
        if state.revision != expected_revision {
            return Err(StoreError::RevisionConflict {
                expected: expected_revision,
                found: state.revision,
            });
        }
        mutate(&mut state);
        state.updated_at = Utc::now();
        state.revision += 1;
        write_atomic(&self.path, &state)?;
        Ok(state.clone())
    }
}

/// Write the record atomically using a temp file and rename.
fn write_atomic(path: &Path, state: &ScheduleState) -> Result<(), StoreError> {
    let encoded = serde_json::to_vec_pretty(state)?;
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(&encoded)?;
    file.sync_all()?;
    fs::rename(temp_path, path)?;
    Ok(())
}
