//! Pipeline for a monitoring cycle:
//!
//! - `aggregate`: walk listing pages into one deduplicated snapshot
//! - `calculate_diff`: classify listings against the previous snapshot
//! - `evaluate`: map the diff plus thresholds to notification events
//! - `run_cycle` / `run_watch`: orchestration around the above

pub mod aggregate;
pub mod alerts;
pub mod cycle;
pub mod diff;
pub mod watch;

pub use aggregate::{Aggregation, aggregate};
pub use alerts::{EventKind, NotificationEvent, evaluate};
pub use cycle::{CycleResult, run_cycle, run_seed};
pub use diff::{DiffResult, FieldDelta, ListingChange, calculate_diff};
pub use watch::{run_seed_all, run_tick, run_watch};
