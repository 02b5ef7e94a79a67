//! Input analysis ahead of the staged run.
//!
//! One pass over the snapshot produces everything the scheduler wants
//! up front: per-tier order queues, capability-profiled driver pools,
//! demand/supply statistics, and human-readable notices about likely
//! bottlenecks. Nothing here decides an allocation; notices are
//! advisory and land verbatim in the final report.
//!
//! Notice severities follow their prefix: `critical:` means some orders
//! cannot possibly be allocated, `warning:` means contention is likely,
//! `info:` is context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Capability, CapabilitySet, Driver, Order};
use crate::tiers::TierPlan;

/// Demand pressure above this many orders per preferring driver flags a
/// region as contended.
const REGION_PRESSURE_RATIO: f64 = 6.0;

/// Evening order count above this multiple of the fleet size flags the
/// day as evening-heavy.
const EVENING_SHARE: f64 = 0.7;

/// Everything the scheduler wants to know before stage one.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Per-tier queues of indices into the input order slice, aligned
    /// with the plan's tiers. Input order is preserved within a queue.
    pub queues: Vec<Vec<usize>>,
    /// Driver ids grouped by capability profile.
    pub pools: DriverPools,
    /// Demand/supply statistics.
    pub stats: BottleneckStats,
    /// Bottleneck notices, most severe concerns first within each group.
    pub notices: Vec<String>,
}

/// Driver ids grouped by capability profile, first match wins:
/// wedding+VIP, wedding, corporate+VIP, corporate, then general.
/// Every driver lands in exactly one pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverPools {
    pub wedding_vip: Vec<String>,
    pub wedding: Vec<String>,
    pub corporate_vip: Vec<String>,
    pub corporate: Vec<String>,
    pub general: Vec<String>,
}

impl DriverPools {
    fn build(drivers: &[Driver]) -> Self {
        let mut pools = Self::default();
        for driver in drivers {
            let caps = driver.capabilities;
            let wedding_vip = CapabilitySet::of(Capability::Wedding).with(Capability::Vip);
            let corporate_vip = CapabilitySet::of(Capability::Corporate).with(Capability::Vip);
            let pool = if caps.contains_all(wedding_vip) {
                &mut pools.wedding_vip
            } else if caps.contains(Capability::Wedding) {
                &mut pools.wedding
            } else if caps.contains_all(corporate_vip) {
                &mut pools.corporate_vip
            } else if caps.contains(Capability::Corporate) {
                &mut pools.corporate
            } else {
                &mut pools.general
            };
            pool.push(driver.id.clone());
        }
        pools
    }
}

/// Demand against supply for one capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDemand {
    pub capability: Capability,
    /// Orders requiring the capability.
    pub requiring_orders: u32,
    /// Drivers holding the capability.
    pub capable_drivers: u32,
    /// Summed daily maxima of those drivers.
    pub capable_capacity: u32,
    /// `requiring_orders / capable_drivers`; 0.0 when no driver holds
    /// the capability (the counts and the critical notice carry that
    /// case).
    pub ratio: f64,
}

/// Orders started per coarse time of day (window start, UTC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDayCounts {
    /// Start hour before 12:00.
    pub morning: u32,
    /// Start hour in [12:00, 18:00).
    pub afternoon: u32,
    /// Start hour from 18:00 on.
    pub evening: u32,
}

/// Snapshot-level demand/supply statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckStats {
    /// One entry per capability, in declaration order.
    pub capability_demand: Vec<CapabilityDemand>,
    pub total_orders: u32,
    /// Summed daily maxima of the whole fleet.
    pub fleet_capacity: u32,
    /// `total_orders / fleet_capacity`, 0.0 for an empty fleet.
    pub demand_ratio: f64,
    pub time_of_day: TimeOfDayCounts,
    /// Order count per region.
    pub orders_by_region: BTreeMap<String, u32>,
}

/// Analyzes a validated snapshot against a tier plan.
///
/// Orders matching no tier fall into the plan's last queue so every
/// order is processed exactly once. The plan must have at least one
/// tier; with an empty plan every queue is absent and orders are
/// silently unclassified, which the scheduler rejects beforehand.
pub fn preprocess(orders: &[Order], drivers: &[Driver], plan: &TierPlan) -> Preprocessed {
    let mut queues: Vec<Vec<usize>> = vec![Vec::new(); plan.len()];
    for (idx, order) in orders.iter().enumerate() {
        match plan.classify(order) {
            Some(tier_idx) => queues[tier_idx].push(idx),
            None => {
                if let Some(last) = queues.last_mut() {
                    last.push(idx);
                }
            }
        }
    }

    let pools = DriverPools::build(drivers);
    let stats = compute_stats(orders, drivers);
    let notices = collect_notices(orders, drivers, &stats);

    Preprocessed {
        queues,
        pools,
        stats,
        notices,
    }
}

fn compute_stats(orders: &[Order], drivers: &[Driver]) -> BottleneckStats {
    let capability_demand = Capability::ALL
        .iter()
        .map(|&cap| {
            let capable: Vec<&Driver> = drivers
                .iter()
                .filter(|d| d.has_capability(cap))
                .collect();
            let requiring_orders = orders.iter().filter(|o| o.requires(cap)).count() as u32;
            let ratio = if capable.is_empty() {
                0.0
            } else {
                f64::from(requiring_orders) / capable.len() as f64
            };
            CapabilityDemand {
                capability: cap,
                requiring_orders,
                capable_drivers: capable.len() as u32,
                capable_capacity: capable.iter().map(|d| d.max_orders).sum(),
                ratio,
            }
        })
        .collect();

    let fleet_capacity: u32 = drivers.iter().map(|d| d.max_orders).sum();
    let total_orders = orders.len() as u32;
    let demand_ratio = if fleet_capacity == 0 {
        0.0
    } else {
        f64::from(total_orders) / f64::from(fleet_capacity)
    };

    let mut time_of_day = TimeOfDayCounts::default();
    for order in orders {
        let hour = order.window.start_hour_utc();
        if hour < 12 {
            time_of_day.morning += 1;
        } else if hour < 18 {
            time_of_day.afternoon += 1;
        } else {
            time_of_day.evening += 1;
        }
    }

    let mut orders_by_region: BTreeMap<String, u32> = BTreeMap::new();
    for order in orders {
        *orders_by_region
            .entry(order.region.trim().to_string())
            .or_insert(0) += 1;
    }

    BottleneckStats {
        capability_demand,
        total_orders,
        fleet_capacity,
        demand_ratio,
        time_of_day,
        orders_by_region,
    }
}

fn collect_notices(orders: &[Order], drivers: &[Driver], stats: &BottleneckStats) -> Vec<String> {
    let mut notices = Vec::new();

    for demand in &stats.capability_demand {
        if demand.requiring_orders == 0 {
            continue;
        }
        let cap = demand.capability.as_str();
        if demand.capable_drivers == 0 {
            notices.push(format!(
                "critical: no driver holds {cap}; {} order(s) cannot be allocated",
                demand.requiring_orders
            ));
            continue;
        }
        if demand.requiring_orders > demand.capable_capacity {
            notices.push(format!(
                "critical: {cap} demand exceeds capable capacity: {} order(s), capacity {}",
                demand.requiring_orders, demand.capable_capacity
            ));
        }
        if demand.requiring_orders > 2 * demand.capable_drivers {
            notices.push(format!(
                "warning: {cap} demand is high: {} order(s) for {} qualified driver(s)",
                demand.requiring_orders, demand.capable_drivers
            ));
        }
    }

    if stats.total_orders > stats.fleet_capacity {
        notices.push(format!(
            "warning: demand exceeds fleet capacity: {} order(s), capacity {}",
            stats.total_orders, stats.fleet_capacity
        ));
    }

    for (region, &count) in &stats.orders_by_region {
        let preferring = drivers
            .iter()
            .filter(|d| d.preferred_region.trim().eq_ignore_ascii_case(region))
            .count() as u32;
        if preferring == 0 {
            notices.push(format!(
                "warning: region {region}: {count} order(s) but no driver prefers it"
            ));
        } else if f64::from(count) / f64::from(preferring) > REGION_PRESSURE_RATIO {
            notices.push(format!(
                "warning: region {region}: {count} order(s) for {preferring} preferring driver(s)"
            ));
        }
    }

    for driver in drivers {
        if driver.max_orders == 0 {
            notices.push(format!(
                "warning: driver {} has zero capacity and will receive no work",
                driver.id
            ));
        }
    }

    if !drivers.is_empty()
        && f64::from(stats.time_of_day.evening) > EVENING_SHARE * drivers.len() as f64
    {
        notices.push(format!(
            "info: evening-heavy day: {} of {} order(s) start in the evening",
            stats.time_of_day.evening, stats.total_orders
        ));
    }

    let pending = orders
        .iter()
        .filter(|o| o.location.as_ref().is_some_and(|l| l.is_address_pending()))
        .count();
    if pending > 0 {
        notices.push(format!("info: {pending} order(s) still have a pending address"));
    }

    notices
}
