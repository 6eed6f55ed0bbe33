//! Worker client ports
//!
//! The orchestrator drives two external collaborators: the import worker
//! (one call per chunk) and the conversion worker (at most one call per
//! run). Both are modeled as explicit client traits with their own timeout
//! and error mapping so no transport detail leaks into the orchestrator.

mod convert;
mod import;

pub use convert::{ConversionResult, ConversionScope, ConversionWorker, HttpConversionWorker};
pub use import::{ChunkResult, HttpImportWorker, ImportWorker, WorkerError};
