//! Dispatch domain models.
//!
//! Provides the core data types for representing allocation problems
//! and their results: what is to be delivered ([`Order`]), who can
//! deliver it ([`Driver`]), and what happened ([`AllocationState`]).
//!
//! | Type | Role |
//! |------|------|
//! | [`Order`] | Delivery request with event window and requirements |
//! | [`Driver`] | Fleet member with capabilities and daily capacity |
//! | [`CapabilitySet`] | Fixed-universe qualification bit-set |
//! | [`TimeWindow`] | Half-open `[start, end)` interval in epoch ms |
//! | [`AllocationState`] | Mutable per-run state: loads, timelines, outcomes |

mod allocation;
mod capability;
mod driver;
mod order;

pub use allocation::{AllocationState, Assignment, OrderOutcome, UnallocatedReason};
pub use capability::{Capability, CapabilitySet};
pub use driver::Driver;
pub use order::{Location, Order, TimeWindow, PENDING_POSTAL_CODE};
