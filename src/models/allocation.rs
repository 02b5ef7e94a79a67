//! Allocation run state and outcome records.
//!
//! One [`AllocationState`] exists per run. It owns everything that changes
//! while stages execute: per-driver load counters, time-ordered committed
//! windows, per-order outcomes, and run notices. Orders and drivers stay
//! immutable; the state addresses them by id. All mutation goes through
//! the methods here so the load/timeline/outcome views can never drift
//! apart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Driver, Order, TimeWindow};

/// Why an order could not be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnallocatedReason {
    /// No driver in the fleet holds the required capabilities.
    CapabilityUnavailable,
    /// Every capable driver is at its daily maximum.
    CapacityExhausted,
    /// Every capable driver with spare capacity has a window clash.
    TimeConflict,
}

impl UnallocatedReason {
    /// Wire name (snake_case tag).
    pub const fn as_str(self) -> &'static str {
        match self {
            UnallocatedReason::CapabilityUnavailable => "capability_unavailable",
            UnallocatedReason::CapacityExhausted => "capacity_exhausted",
            UnallocatedReason::TimeConflict => "time_conflict",
        }
    }
}

/// Final disposition of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    /// Committed to a driver.
    Allocated {
        /// The assigned driver.
        driver_id: String,
        /// Why this pairing was chosen (advisory or deterministic).
        rationale: String,
    },
    /// Left unallocated.
    Unallocated {
        /// Dominant blocking constraint.
        reason: UnallocatedReason,
    },
}

/// A committed order→driver pairing.
///
/// `driver_id` and `window` are denormalized from the inputs for query
/// convenience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned order id.
    pub order_id: String,
    /// Driver the order was committed to.
    pub driver_id: String,
    /// The order's event window.
    pub window: TimeWindow,
    /// Name of the tier the order was processed in.
    pub tier: String,
    /// Why this pairing was chosen.
    pub rationale: String,
}

/// Mutable allocation state, threaded by reference through the run.
#[derive(Debug, Clone)]
pub struct AllocationState {
    /// driver id → committed order count.
    loads: BTreeMap<String, u32>,
    /// driver id → committed (order id, window), kept time-ordered.
    timelines: BTreeMap<String, Vec<(String, TimeWindow)>>,
    /// order id → final disposition.
    outcomes: BTreeMap<String, OrderOutcome>,
    /// Commit log, in commit order.
    assignments: Vec<Assignment>,
    /// Unallocated orders, in the order they were given up on.
    unallocated: Vec<(String, UnallocatedReason)>,
    /// Run notices (preprocessing findings, degraded-mode events).
    notices: Vec<String>,
}

impl AllocationState {
    /// Creates empty run state for the given fleet.
    pub fn new(drivers: &[Driver]) -> Self {
        Self {
            loads: drivers.iter().map(|d| (d.id.clone(), 0)).collect(),
            timelines: drivers.iter().map(|d| (d.id.clone(), Vec::new())).collect(),
            outcomes: BTreeMap::new(),
            assignments: Vec::new(),
            unallocated: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Committed order count for a driver (0 if unknown).
    pub fn load_of(&self, driver_id: &str) -> u32 {
        self.loads.get(driver_id).copied().unwrap_or(0)
    }

    /// Committed windows for a driver, time-ordered (empty if unknown).
    pub fn timeline_of(&self, driver_id: &str) -> &[(String, TimeWindow)] {
        self.timelines
            .get(driver_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records a committed pairing.
    ///
    /// Increments the driver's load, inserts the order's window into the
    /// timeline keeping it sorted by start, and records the outcome. The
    /// caller is responsible for feasibility screening — no checks happen
    /// here.
    pub fn commit(
        &mut self,
        order: &Order,
        driver_id: &str,
        tier: &str,
        rationale: impl Into<String>,
    ) {
        let rationale = rationale.into();

        *self.loads.entry(driver_id.to_string()).or_insert(0) += 1;

        let timeline = self.timelines.entry(driver_id.to_string()).or_default();
        let at = timeline.partition_point(|(_, w)| w.start_ms <= order.window.start_ms);
        timeline.insert(at, (order.id.clone(), order.window.clone()));

        self.outcomes.insert(
            order.id.clone(),
            OrderOutcome::Allocated {
                driver_id: driver_id.to_string(),
                rationale: rationale.clone(),
            },
        );
        self.assignments.push(Assignment {
            order_id: order.id.clone(),
            driver_id: driver_id.to_string(),
            window: order.window.clone(),
            tier: tier.to_string(),
            rationale,
        });
    }

    /// Records that an order could not be allocated.
    pub fn mark_unallocated(&mut self, order_id: &str, reason: UnallocatedReason) {
        self.outcomes
            .insert(order_id.to_string(), OrderOutcome::Unallocated { reason });
        self.unallocated.push((order_id.to_string(), reason));
    }

    /// The outcome recorded for an order, if any.
    pub fn outcome_of(&self, order_id: &str) -> Option<&OrderOutcome> {
        self.outcomes.get(order_id)
    }

    /// Whether an order was committed to a driver.
    pub fn is_allocated(&self, order_id: &str) -> bool {
        matches!(
            self.outcomes.get(order_id),
            Some(OrderOutcome::Allocated { .. })
        )
    }

    /// All committed pairings, in commit order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Committed pairings for one driver, in commit order.
    pub fn assignments_of(&self, driver_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.driver_id == driver_id)
            .collect()
    }

    /// Number of committed orders.
    pub fn allocated_count(&self) -> usize {
        self.assignments.len()
    }

    /// Unallocated orders with reasons, in the order they were given up on.
    pub fn unallocated(&self) -> &[(String, UnallocatedReason)] {
        &self.unallocated
    }

    /// Appends a run notice.
    pub fn push_notice(&mut self, notice: impl Into<String>) {
        self.notices.push(notice.into());
    }

    /// Run notices recorded so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}
