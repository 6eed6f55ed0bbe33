//! ingestd: Resumable Batch-Import Orchestrator
//!
//! A small daemon that pulls a large external dataset into the local store in
//! bounded chunks, optionally triggers a dependent image-conversion phase,
//! persists enough state to resume after partial failure or restart, and
//! computes its own next scheduled run time. Features:
//! - Chunked import loop with a durable offset checkpoint after every chunk
//! - Run guard ensuring at most one active run per schedule
//! - Optional best-effort conversion phase after full import exhaustion
//! - Time-of-day recurrence for the next scheduled run
//! - HTTP trigger surface for external schedulers and dashboards

pub mod config;
pub mod http;
pub mod orchestrator;
pub mod schedule;
pub mod worker;

pub use config::Config;
pub use orchestrator::{Orchestrator, RunError, RunReport};
pub use schedule::{ScheduleState, ScheduleStatus, ScheduleStore};
