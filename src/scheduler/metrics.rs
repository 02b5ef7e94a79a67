//! Run metrics.
//!
//! Computed once from the finished state; nothing here feeds back into
//! allocation decisions. All maps are ordered so serialized reports are
//! byte-stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::constraints::region_score;
use crate::models::{AllocationState, Driver, Order, OrderOutcome};

/// Aggregated measurements for one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationMetrics {
    /// Orders in the input snapshot.
    pub total_orders: u32,
    /// Orders committed to a driver.
    pub allocated: u32,
    /// `allocated / total_orders`; 1.0 for an empty snapshot.
    pub allocation_rate: f64,
    /// Mean utilization across drivers with nonzero capacity.
    pub avg_utilization: f64,
    /// Per-driver `load / max_orders`; 0.0 for zero-capacity drivers.
    pub utilization_by_driver: BTreeMap<String, f64>,
    /// Share of allocated orders served by a driver preferring the
    /// order's region; 1.0 when nothing was allocated.
    pub regional_efficiency: f64,
    /// Allocated orders per region.
    pub orders_by_region: BTreeMap<String, u32>,
    /// Unallocated orders per reason.
    pub reason_counts: BTreeMap<String, u32>,
}

impl AllocationMetrics {
    /// Computes all metrics from a finished run.
    pub fn calculate(orders: &[Order], drivers: &[Driver], state: &AllocationState) -> Self {
        let order_by_id: HashMap<&str, &Order> =
            orders.iter().map(|o| (o.id.as_str(), o)).collect();
        let driver_by_id: HashMap<&str, &Driver> =
            drivers.iter().map(|d| (d.id.as_str(), d)).collect();

        let total_orders = orders.len() as u32;
        let allocated = state.allocated_count() as u32;
        let allocation_rate = if total_orders == 0 {
            1.0
        } else {
            f64::from(allocated) / f64::from(total_orders)
        };

        let mut utilization_by_driver = BTreeMap::new();
        let mut utilization_sum = 0.0;
        let mut with_capacity = 0u32;
        for driver in drivers {
            let utilization = if driver.max_orders == 0 {
                0.0
            } else {
                with_capacity += 1;
                let u = f64::from(state.load_of(&driver.id)) / f64::from(driver.max_orders);
                utilization_sum += u;
                u
            };
            utilization_by_driver.insert(driver.id.clone(), utilization);
        }
        let avg_utilization = if with_capacity == 0 {
            0.0
        } else {
            utilization_sum / f64::from(with_capacity)
        };

        let mut in_region = 0u32;
        let mut orders_by_region: BTreeMap<String, u32> = BTreeMap::new();
        for assignment in state.assignments() {
            let order = order_by_id.get(assignment.order_id.as_str());
            let driver = driver_by_id.get(assignment.driver_id.as_str());
            if let (Some(order), Some(driver)) = (order, driver) {
                if region_score(order, driver) == 0 {
                    in_region += 1;
                }
                *orders_by_region
                    .entry(order.region.trim().to_string())
                    .or_insert(0) += 1;
            }
        }
        let regional_efficiency = if allocated == 0 {
            1.0
        } else {
            f64::from(in_region) / f64::from(allocated)
        };

        let mut reason_counts: BTreeMap<String, u32> = BTreeMap::new();
        for order in orders {
            if let Some(OrderOutcome::Unallocated { reason }) = state.outcome_of(&order.id) {
                *reason_counts.entry(reason.as_str().to_string()).or_insert(0) += 1;
            }
        }

        Self {
            total_orders,
            allocated,
            allocation_rate,
            avg_utilization,
            utilization_by_driver,
            regional_efficiency,
            orders_by_region,
            reason_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnallocatedReason;

    const HOUR: i64 = 3_600_000;

    fn make_order(id: &str, region: &str) -> Order {
        Order::new(id, 9 * HOUR, 10 * HOUR).with_region(region)
    }

    #[test]
    fn test_empty_snapshot_rates() {
        let metrics = AllocationMetrics::calculate(&[], &[], &AllocationState::new(&[]));
        assert_eq!(metrics.allocation_rate, 1.0);
        assert_eq!(metrics.regional_efficiency, 1.0);
        assert_eq!(metrics.avg_utilization, 0.0);
        assert!(metrics.utilization_by_driver.is_empty());
    }

    #[test]
    fn test_allocation_rate_and_utilization() {
        let orders = vec![
            make_order("Q1", "east"),
            make_order("Q2", "east"),
            make_order("Q3", "west"),
        ];
        let drivers = vec![
            Driver::new("D1").with_max_orders(2).with_preferred_region("east"),
            Driver::new("D2").with_max_orders(4),
        ];
        let mut state = AllocationState::new(&drivers);
        state.commit(&orders[0], "D1", "standard", "");
        state.commit(&orders[2], "D2", "standard", "");
        state.mark_unallocated("Q2", UnallocatedReason::TimeConflict);

        let metrics = AllocationMetrics::calculate(&orders, &drivers, &state);
        assert_eq!(metrics.total_orders, 3);
        assert_eq!(metrics.allocated, 2);
        assert!((metrics.allocation_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((metrics.utilization_by_driver["D1"] - 0.5).abs() < 1e-9);
        assert!((metrics.utilization_by_driver["D2"] - 0.25).abs() < 1e-9);
        assert!((metrics.avg_utilization - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_driver_excluded_from_average() {
        let drivers = vec![
            Driver::new("D1").with_max_orders(0),
            Driver::new("D2").with_max_orders(2),
        ];
        let orders = vec![make_order("Q1", "east")];
        let mut state = AllocationState::new(&drivers);
        state.commit(&orders[0], "D2", "standard", "");

        let metrics = AllocationMetrics::calculate(&orders, &drivers, &state);
        assert_eq!(metrics.utilization_by_driver["D1"], 0.0);
        assert!((metrics.avg_utilization - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_regional_efficiency_counts_preferring_drivers() {
        let orders = vec![make_order("Q1", "east"), make_order("Q2", "west")];
        let drivers = vec![
            Driver::new("D1").with_preferred_region("east").with_max_orders(2),
            Driver::new("D2").with_preferred_region("east").with_max_orders(2),
        ];
        let mut state = AllocationState::new(&drivers);
        state.commit(&orders[0], "D1", "standard", ""); // in region
        state.commit(&orders[1], "D2", "standard", ""); // out of region

        let metrics = AllocationMetrics::calculate(&orders, &drivers, &state);
        assert!((metrics.regional_efficiency - 0.5).abs() < 1e-9);
        assert_eq!(metrics.orders_by_region["east"], 1);
        assert_eq!(metrics.orders_by_region["west"], 1);
    }

    #[test]
    fn test_reason_counts() {
        let orders = vec![
            make_order("Q1", "east"),
            make_order("Q2", "east"),
            make_order("Q3", "east"),
        ];
        let mut state = AllocationState::new(&[]);
        state.mark_unallocated("Q1", UnallocatedReason::CapacityExhausted);
        state.mark_unallocated("Q2", UnallocatedReason::CapacityExhausted);
        state.mark_unallocated("Q3", UnallocatedReason::CapabilityUnavailable);

        let metrics = AllocationMetrics::calculate(&orders, &[], &state);
        assert_eq!(metrics.reason_counts["capacity_exhausted"], 2);
        assert_eq!(metrics.reason_counts["capability_unavailable"], 1);
        assert_eq!(metrics.allocated, 0);
        assert_eq!(metrics.regional_efficiency, 1.0);
    }

    #[test]
    fn test_metrics_serialize_with_ordered_keys() {
        let orders = vec![make_order("Q1", "east")];
        let drivers = vec![Driver::new("D1").with_max_orders(1)];
        let mut state = AllocationState::new(&drivers);
        state.commit(&orders[0], "D1", "standard", "");

        let metrics = AllocationMetrics::calculate(&orders, &drivers, &state);
        let first = serde_json::to_string(&metrics).unwrap();
        let second = serde_json::to_string(&metrics).unwrap();
        assert_eq!(first, second);
        assert!(first.contains(r#""allocation_rate":1.0"#));
    }
}
