//! Feasibility predicates.
//!
//! Every check is a pure function of an immutable order/driver pair and
//! the current [`AllocationState`]. Nothing here mutates anything; the
//! scheduler screens each candidate pairing through [`feasible`] before
//! committing, and ranking advice goes through exactly the same screen.
//!
//! Hard constraints (all must hold):
//! - capability: the driver holds every capability the order requires
//! - capacity: the driver is below its daily maximum
//! - separation: the order's window, widened by the travel-plus-buffer
//!   margin, overlaps none of the driver's committed windows
//!
//! Region preference is deliberately soft — see [`region_score`].

use std::collections::{HashMap, HashSet};

use crate::config::AllocatorConfig;
use crate::models::{AllocationState, Driver, Order, UnallocatedReason};

/// Whether the driver holds every capability the order requires.
pub fn capability_check(order: &Order, driver: &Driver) -> bool {
    driver.can_serve(order)
}

/// Whether the driver has room for one more order.
pub fn capacity_check(driver: &Driver, state: &AllocationState) -> bool {
    state.load_of(&driver.id) < driver.max_orders
}

/// Whether the order fits the driver's committed timeline.
///
/// The order's window is widened by the margin on both sides and tested
/// against the driver's committed windows as stored. Windows are
/// half-open, so two events separated by exactly the margin are
/// compatible.
pub fn time_conflict_check(
    order: &Order,
    driver: &Driver,
    state: &AllocationState,
    config: &AllocatorConfig,
) -> bool {
    let effective = order.window.expanded(config.margin_ms());
    state
        .timeline_of(&driver.id)
        .iter()
        .all(|(_, committed)| !effective.overlaps(committed))
}

/// Conjunction of all hard constraints, cheapest first.
pub fn feasible(
    order: &Order,
    driver: &Driver,
    state: &AllocationState,
    config: &AllocatorConfig,
) -> bool {
    capability_check(order, driver)
        && capacity_check(driver, state)
        && time_conflict_check(order, driver, state, config)
}

/// Region preference score: 0 when the driver prefers the order's
/// region, 1 otherwise. Lower is better. Comparison ignores case and
/// surrounding whitespace; a driver with no preferred region scores 1
/// everywhere.
pub fn region_score(order: &Order, driver: &Driver) -> u32 {
    let preferred = driver.preferred_region.trim();
    if !preferred.is_empty() && preferred.eq_ignore_ascii_case(order.region.trim()) {
        0
    } else {
        1
    }
}

/// Explains why no driver could take the order, checking the whole
/// fleet in constraint order: capability first, then capacity, then
/// time. The reported reason is the first constraint that eliminated
/// every remaining driver.
pub fn classify_failure(
    order: &Order,
    drivers: &[Driver],
    state: &AllocationState,
    config: &AllocatorConfig,
) -> UnallocatedReason {
    let capable: Vec<&Driver> = drivers
        .iter()
        .filter(|d| capability_check(order, d))
        .collect();
    if capable.is_empty() {
        return UnallocatedReason::CapabilityUnavailable;
    }

    if !capable.iter().any(|d| capacity_check(d, state)) {
        return UnallocatedReason::CapacityExhausted;
    }

    UnallocatedReason::TimeConflict
}

/// Category of an audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    /// An order appears in more than one assignment.
    DuplicateAssignment,
    /// A driver carries more orders than its daily maximum.
    CapacityExceeded,
    /// An assigned driver lacks a required capability.
    CapabilityMismatch,
    /// Two of a driver's committed windows sit closer than the margin.
    SeparationViolated,
    /// An assignment names an order absent from the input.
    UnknownOrder,
    /// An assignment names a driver absent from the input.
    UnknownDriver,
}

/// One inconsistency between a finished state and the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    /// What went wrong.
    pub kind: AuditKind,
    /// Description naming the entities involved.
    pub message: String,
}

impl AuditFinding {
    fn new(kind: AuditKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Cross-checks a finished state against the inputs.
///
/// A clean run yields no findings; [`AllocationState::commit`] performs
/// no screening of its own, so this is the independent check that the
/// scheduler's screening actually held.
pub fn audit(
    orders: &[Order],
    drivers: &[Driver],
    state: &AllocationState,
    config: &AllocatorConfig,
) -> Vec<AuditFinding> {
    let mut findings = Vec::new();

    let order_by_id: HashMap<&str, &Order> = orders.iter().map(|o| (o.id.as_str(), o)).collect();
    let driver_by_id: HashMap<&str, &Driver> =
        drivers.iter().map(|d| (d.id.as_str(), d)).collect();

    let mut seen = HashSet::new();
    for a in state.assignments() {
        if !seen.insert(a.order_id.as_str()) {
            findings.push(AuditFinding::new(
                AuditKind::DuplicateAssignment,
                format!("order {} assigned more than once", a.order_id),
            ));
        }

        let order = match order_by_id.get(a.order_id.as_str()) {
            Some(order) => *order,
            None => {
                findings.push(AuditFinding::new(
                    AuditKind::UnknownOrder,
                    format!("assignment references unknown order {}", a.order_id),
                ));
                continue;
            }
        };
        let driver = match driver_by_id.get(a.driver_id.as_str()) {
            Some(driver) => *driver,
            None => {
                findings.push(AuditFinding::new(
                    AuditKind::UnknownDriver,
                    format!("assignment references unknown driver {}", a.driver_id),
                ));
                continue;
            }
        };

        if !capability_check(order, driver) {
            findings.push(AuditFinding::new(
                AuditKind::CapabilityMismatch,
                format!(
                    "driver {} lacks a capability required by order {}",
                    driver.id, order.id
                ),
            ));
        }
    }

    for driver in drivers {
        let load = state.load_of(&driver.id);
        if load > driver.max_orders {
            findings.push(AuditFinding::new(
                AuditKind::CapacityExceeded,
                format!(
                    "driver {} carries {} orders, maximum is {}",
                    driver.id, load, driver.max_orders
                ),
            ));
        }

        let timeline = state.timeline_of(&driver.id);
        for pair in timeline.windows(2) {
            let (first_id, first) = &pair[0];
            let (second_id, second) = &pair[1];
            if first.expanded(config.margin_ms()).overlaps(second) {
                findings.push(AuditFinding::new(
                    AuditKind::SeparationViolated,
                    format!(
                        "driver {}: orders {} and {} are closer than the margin",
                        driver.id, first_id, second_id
                    ),
                ));
            }
        }
    }

    findings
}
