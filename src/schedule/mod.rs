//! Schedule state and persistence
//!
//! The schedule is a single durable record: configuration (source location,
//! recurrence time, conversion toggle) plus the mutable run state the
//! orchestrator checkpoints between chunks. All mutation goes through
//! [`ScheduleStore`], which is the run guard's single point of atomicity.

mod recurrence;
mod state;
mod store;

pub use recurrence::next_occurrence;
pub use state::{ScheduleState, ScheduleStatus};
pub use store::{AcquireOutcome, ScheduleStore, StoreError};
