//! Sync fan-out planning and session-driven execution.
//!
//! [`plan_sync`] expands one source URL against an ordered target list
//! into a lazily produced stream of copy jobs; [`run_sync`] drives that
//! stream (or replays a resumed session's data log) through the storage
//! clients, checkpointing progress after every unit.

pub mod planner;
pub mod runner;

pub use planner::plan_sync;
pub use runner::{FailedJob, SyncError, SyncSummary, run_sync};
