//! The durable schedule record

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Run status of the schedule
///
/// `Running`, `Importing` and `Converting` form the in-progress family; the
/// run guard refuses new triggers while the schedule is in any of them.
/// `Completed` and `Failed` are terminal for a run but not for the schedule:
/// the next trigger starts fresh from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Idle,
    Running,
    Importing,
    Converting,
    Completed,
    Failed,
}

impl ScheduleStatus {
    /// Whether a run is currently holding the schedule
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Running | Self::Importing | Self::Converting)
    }

    /// Whether the previous run reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Importing => "importing",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Singleton schedule record: configuration plus mutable run state.
///
/// Created once administratively (`ingestd init`), mutated exclusively by
/// the orchestrator during a run. The `revision` counter makes the run
/// guard's check-then-set race-free: every store update asserts the revision
/// it read and bumps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Record identifier
    pub id: Uuid,
    /// Location of the external dataset
    pub source_url: String,
    /// Whether the schedule may run at all
    pub enabled: bool,
    /// Time-of-day recurrence rule (UTC)
    pub scheduled_time: NaiveTime,
    /// Run the conversion phase after a fully exhausted import
    pub auto_convert_images: bool,
    /// Current run status
    pub status: ScheduleStatus,
    /// Cursor into the source dataset where the next chunk begins
    pub current_offset: u64,
    /// Best known dataset size, filled in once the import worker reports it
    pub total_rows: Option<u64>,
    /// When the last run was started
    pub last_run_at: Option<DateTime<Utc>>,
    /// When the next run should be triggered
    pub next_run_at: Option<DateTime<Utc>>,
    /// Terminal error of the last run, if it failed
    pub error_message: Option<String>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter
    pub revision: u64,
}

impl ScheduleState {
    /// Create a fresh, idle schedule record
    pub fn new(
        source_url: impl Into<String>,
        scheduled_time: NaiveTime,
        auto_convert_images: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_url: source_url.into(),
            enabled: true,
            scheduled_time,
            auto_convert_images,
            status: ScheduleStatus::Idle,
            current_offset: 0,
            total_rows: None,
            last_run_at: None,
            next_run_at: None,
            error_message: None,
            updated_at: Utc::now(),
            revision: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_family_blocks_new_runs() {
        assert!(ScheduleStatus::Running.is_in_progress());
        assert!(ScheduleStatus::Importing.is_in_progress());
        assert!(ScheduleStatus::Converting.is_in_progress());
        assert!(!ScheduleStatus::Idle.is_in_progress());
        assert!(!ScheduleStatus::Completed.is_in_progress());
        assert!(!ScheduleStatus::Failed.is_in_progress());
    }

    #[test]
    fn terminal_states() {
        assert!(ScheduleStatus::Completed.is_terminal());
        assert!(ScheduleStatus::Failed.is_terminal());
        assert!(!ScheduleStatus::Running.is_terminal());
        assert!(!ScheduleStatus::Idle.is_terminal());
    }

    #[test]
    fn status_serializes_as_lowercase_strings() {
        let json = serde_json::to_string(&ScheduleStatus::Importing).unwrap();
        assert_eq!(json, "\"importing\"");
        let back: ScheduleStatus = serde_json::from_str("\"converting\"").unwrap();
        assert_eq!(back, ScheduleStatus::Converting);
    }

    #[test]
    fn new_schedule_starts_idle_at_offset_zero() {
        let time = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let state = ScheduleState::new("https://example.com/dump.csv", time, true);
        assert_eq!(state.status, ScheduleStatus::Idle);
        assert_eq!(state.current_offset, 0);
        assert!(state.enabled);
        assert!(state.last_run_at.is_none());
        assert_eq!(state.revision, 0);
    }
}
