//! Refresh scheduler driving the fetch, cache, merge and publish cycle.
//!
//! Two states: idle (waiting for the next tick) and refreshing. A cycle runs
//! to completion before the interval starts counting, so cycles never
//! overlap. Failures of single sources or artifacts are absorbed by the
//! cycle; the loop itself has no failed state.

mod config;
mod runner;
mod types;

pub use config::{ReadinessPolicy, RefreshConfig, DEFAULT_SOURCES};
pub use runner::RefreshScheduler;
pub use types::{CycleReport, SchedulerStatus, SourceFailure};
