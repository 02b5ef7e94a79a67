//! Ordered tier plan.
//!
//! A run processes orders in strict tier order: every order of tier `k`
//! gets its outcome before any order of tier `k+1` is looked at. Each
//! tier pairs a selector (which orders belong here) with a tie-break
//! (how the tier's queue is ordered when no ranking advice applies).
//!
//! Classification is first-match over the plan: an order lands in the
//! earliest tier whose selector accepts it, so an order carrying both
//! VIP and corporate requirements is a VIP-tier order under the
//! standard plan. Orders matching no selector fall into the plan's
//! last tier so every order gets exactly one outcome.
//!
//! # Standard plan
//!
//! | # | Tier | Accepts |
//! |---|------|---------|
//! | 1 | `vip_wedding` | VIP and wedding both required |
//! | 2 | `vip` | VIP required |
//! | 3 | `wedding` | wedding required |
//! | 4 | `corporate` | corporate event required |
//! | 5 | `standard` | everything |

use std::fmt;
use std::sync::Arc;

use crate::models::{Capability, Order};

/// Decides whether an order belongs to a tier.
///
/// Selectors are pure: classification must depend only on the order.
pub trait TierSelector: Send + Sync {
    /// Stable tier name; used in assignments, logs, and ranking requests.
    fn name(&self) -> &'static str;

    /// Whether the order belongs to this tier.
    fn matches(&self, order: &Order) -> bool;
}

/// Orders requiring both VIP and wedding service.
pub struct VipWedding;

impl TierSelector for VipWedding {
    fn name(&self) -> &'static str {
        "vip_wedding"
    }

    fn matches(&self, order: &Order) -> bool {
        order.requires(Capability::Vip) && order.requires(Capability::Wedding)
    }
}

/// Orders requiring VIP service.
pub struct VipOnly;

impl TierSelector for VipOnly {
    fn name(&self) -> &'static str {
        "vip"
    }

    fn matches(&self, order: &Order) -> bool {
        order.requires(Capability::Vip)
    }
}

/// Orders requiring wedding service.
pub struct WeddingOnly;

impl TierSelector for WeddingOnly {
    fn name(&self) -> &'static str {
        "wedding"
    }

    fn matches(&self, order: &Order) -> bool {
        order.requires(Capability::Wedding)
    }
}

/// Orders requiring corporate event service.
pub struct Corporate;

impl TierSelector for Corporate {
    fn name(&self) -> &'static str {
        "corporate"
    }

    fn matches(&self, order: &Order) -> bool {
        order.requires(Capability::Corporate)
    }
}

/// Catch-all: accepts every order.
pub struct Standard;

impl TierSelector for Standard {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn matches(&self, _order: &Order) -> bool {
        true
    }
}

/// Queue ordering within a tier when no ranking advice applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Larger parties first; equal parties by ascending order id.
    #[default]
    PartySizeDesc,
    /// Keep the input snapshot's order.
    InputOrder,
}

impl TieBreak {
    /// Orders a tier queue in place.
    pub fn sort_queue(self, queue: &mut [&Order]) {
        match self {
            TieBreak::PartySizeDesc => {
                queue.sort_by(|a, b| {
                    b.party_size
                        .cmp(&a.party_size)
                        .then_with(|| a.id.cmp(&b.id))
                });
            }
            TieBreak::InputOrder => {}
        }
    }
}

/// One tier: a selector plus its queue ordering.
#[derive(Clone)]
pub struct Tier {
    selector: Arc<dyn TierSelector>,
    tie_break: TieBreak,
}

impl Tier {
    /// Creates a tier with the default tie-break.
    pub fn new(selector: impl TierSelector + 'static) -> Self {
        Self {
            selector: Arc::new(selector),
            tie_break: TieBreak::default(),
        }
    }

    /// Sets the tie-break.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// The tier's stable name.
    pub fn name(&self) -> &'static str {
        self.selector.name()
    }

    /// Whether the order belongs to this tier.
    pub fn matches(&self, order: &Order) -> bool {
        self.selector.matches(order)
    }

    /// The tier's queue ordering.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

impl fmt::Debug for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tier")
            .field("name", &self.selector.name())
            .field("tie_break", &self.tie_break)
            .finish()
    }
}

/// An ordered list of tiers.
#[derive(Clone)]
pub struct TierPlan {
    tiers: Vec<Tier>,
}

impl TierPlan {
    /// Creates an empty plan. An empty plan is rejected at run time;
    /// add at least one tier.
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Appends a tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tiers.push(tier);
        self
    }

    /// The five-tier standard plan (see module docs).
    pub fn standard() -> Self {
        Self::new()
            .with_tier(Tier::new(VipWedding))
            .with_tier(Tier::new(VipOnly))
            .with_tier(Tier::new(WeddingOnly))
            .with_tier(Tier::new(Corporate))
            .with_tier(Tier::new(Standard))
    }

    /// The tiers, in processing order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Whether the plan has no tiers.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Index of the first tier accepting the order, if any.
    pub fn classify(&self, order: &Order) -> Option<usize> {
        self.tiers.iter().position(|t| t.matches(order))
    }
}

impl Default for TierPlan {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for TierPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tiers.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with(caps: &[Capability]) -> Order {
        let mut order = Order::new("Q1", 0, 1000).with_region("east");
        for &cap in caps {
            order = order.with_required(cap);
        }
        order
    }

    #[test]
    fn test_standard_plan_order() {
        let plan = TierPlan::standard();
        let names: Vec<&str> = plan.tiers().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["vip_wedding", "vip", "wedding", "corporate", "standard"]
        );
    }

    #[test]
    fn test_first_match_classification() {
        let plan = TierPlan::standard();

        let both = order_with(&[Capability::Vip, Capability::Wedding]);
        assert_eq!(plan.classify(&both), Some(0));

        let vip = order_with(&[Capability::Vip]);
        assert_eq!(plan.classify(&vip), Some(1));

        let wedding = order_with(&[Capability::Wedding]);
        assert_eq!(plan.classify(&wedding), Some(2));

        let corporate = order_with(&[Capability::Corporate]);
        assert_eq!(plan.classify(&corporate), Some(3));

        let plain = order_with(&[]);
        assert_eq!(plan.classify(&plain), Some(4));
    }

    #[test]
    fn test_vip_corporate_lands_in_vip_tier() {
        let plan = TierPlan::standard();
        let order = order_with(&[Capability::Vip, Capability::Corporate]);
        assert_eq!(plan.classify(&order), Some(1));
    }

    #[test]
    fn test_early_setup_alone_is_standard_tier() {
        let plan = TierPlan::standard();
        let order = order_with(&[Capability::EarlySetup]);
        assert_eq!(plan.classify(&order), Some(4));
    }

    #[test]
    fn test_party_size_desc_tie_break() {
        let a = Order::new("A", 0, 1000).with_party_size(2);
        let b = Order::new("B", 0, 1000).with_party_size(8);
        let c = Order::new("C", 0, 1000).with_party_size(8);
        let d = Order::new("D", 0, 1000).with_party_size(5);

        let mut queue: Vec<&Order> = vec![&a, &c, &d, &b];
        TieBreak::PartySizeDesc.sort_queue(&mut queue);
        let ids: Vec<&str> = queue.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn test_input_order_tie_break_keeps_positions() {
        let a = Order::new("A", 0, 1000).with_party_size(1);
        let b = Order::new("B", 0, 1000).with_party_size(9);

        let mut queue: Vec<&Order> = vec![&a, &b];
        TieBreak::InputOrder.sort_queue(&mut queue);
        let ids: Vec<&str> = queue.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_custom_plan_without_catch_all() {
        let plan = TierPlan::new()
            .with_tier(Tier::new(WeddingOnly))
            .with_tier(Tier::new(Corporate));

        let plain = order_with(&[]);
        assert_eq!(plan.classify(&plain), None);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_debug_lists_tier_names() {
        let plan = TierPlan::standard();
        let rendered = format!("{plan:?}");
        assert!(rendered.contains("vip_wedding"));
        assert!(rendered.contains("standard"));
    }
}
