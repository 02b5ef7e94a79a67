//! Staged delivery-order allocation engine.
//!
//! Takes a day's order snapshot and a driver fleet and produces a
//! deterministic allocation: who delivers what, why, and why not. The
//! run proceeds tier by tier (premium demand first), commits greedily,
//! never backtracks, and optionally consults an external ranking
//! backend whose advice is re-screened against the hard constraints
//! before anything is committed.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Order`, `Driver`, `CapabilitySet`,
//!   `TimeWindow`, `AllocationState`
//! - **`validation`**: Input integrity checks (duplicate ids, inverted
//!   windows, missing regions)
//! - **`preprocess`**: Tier queues, driver pools, bottleneck notices
//! - **`constraints`**: Feasibility predicates and the post-run audit
//! - **`tiers`**: The ordered tier plan and its selectors
//! - **`oracle`**: Advisory ranking backend trait and wire schema
//! - **`scheduler`**: The staged engine and run metrics
//! - **`config`**: Run parameters (margins, deadline, strategy)
//!
//! # Pipeline
//!
//! ```text
//! orders + drivers
//!   └─ validate ─ preprocess ─ [tier 1 ─ tier 2 ─ … ─ tier n] ─ report
//!                                 │
//!                                 └─ oracle advice (optional, screened)
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Toth & Vigo (2014), "Vehicle Routing: Problems, Methods, and
//!   Applications"

pub mod config;
pub mod constraints;
pub mod error;
pub mod models;
pub mod oracle;
pub mod preprocess;
pub mod scheduler;
pub mod telemetry;
pub mod tiers;
pub mod validation;
