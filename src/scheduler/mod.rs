//! Staged allocation and run metrics.
//!
//! Provides the tier-by-tier greedy allocator and the measurements
//! derived from a finished run.
//!
//! # Algorithm
//!
//! `StageScheduler` processes the tier plan in order and commits each
//! order to the best feasible driver at that moment, never revisiting
//! a commitment. It is not optimal, but it is fast, predictable, and
//! explains every outcome.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2
//!   (dispatching under eligibility constraints)

mod engine;
mod metrics;

pub use engine::{AllocationReport, DriverAllocation, StageScheduler, UnallocatedOrder};
pub use metrics::AllocationMetrics;
