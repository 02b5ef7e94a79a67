//! Driver model.
//!
//! Drivers are the fleet side of the allocation: each one carries a fixed
//! capability set, a daily order capacity, and a preferred service region.
//! Like orders, driver records are immutable inputs — per-run load and
//! timeline live in [`AllocationState`](super::AllocationState).

use serde::{Deserialize, Serialize};

use super::{Capability, CapabilitySet, Order};

/// A delivery driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Driver {
    /// Unique driver identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Capabilities this driver holds.
    pub capabilities: CapabilitySet,
    /// Maximum orders per day.
    pub max_orders: u32,
    /// Region this driver prefers to work in.
    pub preferred_region: String,
}

impl Driver {
    /// Creates a new driver with capacity 1 and no capabilities.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capabilities: CapabilitySet::empty(),
            max_orders: 1,
            preferred_region: String::new(),
        }
    }

    /// Sets the driver name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a capability.
    pub fn with_capability(mut self, cap: Capability) -> Self {
        self.capabilities = self.capabilities.with(cap);
        self
    }

    /// Sets the daily order capacity.
    pub fn with_max_orders(mut self, max_orders: u32) -> Self {
        self.max_orders = max_orders;
        self
    }

    /// Sets the preferred region.
    pub fn with_preferred_region(mut self, region: impl Into<String>) -> Self {
        self.preferred_region = region.into();
        self
    }

    /// Whether this driver holds a given capability.
    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Whether this driver holds every capability the order requires.
    ///
    /// Capability screening only — capacity and timeline are checked
    /// against run state by the constraint predicates.
    pub fn can_serve(&self, order: &Order) -> bool {
        self.capabilities.contains_all(order.required)
    }
}
