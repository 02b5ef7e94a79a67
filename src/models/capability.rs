//! Service capability flags.
//!
//! Orders declare the capabilities their event requires; drivers declare
//! the capabilities they hold. The catalogue is closed — four flags cover
//! every service class — so capabilities pack into a one-byte bit-set and
//! the "driver can handle order" test is a single mask comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A service capability a driver can hold and an order can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Full-service wedding events.
    Wedding,
    /// VIP clients requiring white-glove handling.
    Vip,
    /// Corporate functions and seminars.
    Corporate,
    /// Setup crews that start before regular hours.
    EarlySetup,
}

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Capability; 4] = [
        Capability::Wedding,
        Capability::Vip,
        Capability::Corporate,
        Capability::EarlySetup,
    ];

    /// Wire name (snake_case tag).
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Wedding => "wedding",
            Capability::Vip => "vip",
            Capability::Corporate => "corporate",
            Capability::EarlySetup => "early_setup",
        }
    }

    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of capabilities packed into one byte.
///
/// Serializes as a sequence of [`Capability`] tags. The subset test
/// (`contains_all`) compiles to a mask compare, which keeps capability
/// screening branch-free on the allocation hot path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set containing a single capability.
    pub const fn of(cap: Capability) -> Self {
        Self(cap.mask())
    }

    /// Returns this set with `cap` added.
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.mask())
    }

    /// Whether `cap` is in the set.
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.mask() != 0
    }

    /// Whether every capability in `required` is present in `self`.
    pub const fn contains_all(self, required: CapabilitySet) -> bool {
        self.0 & required.0 == required.0
    }

    /// Whether the two sets share at least one capability.
    pub const fn intersects(self, other: CapabilitySet) -> bool {
        self.0 & other.0 != 0
    }

    /// Set union.
    pub const fn union(self, other: CapabilitySet) -> CapabilitySet {
        Self(self.0 | other.0)
    }

    /// Number of capabilities in the set.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(caps: Vec<Capability>) -> Self {
        caps.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(set: CapabilitySet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), CapabilitySet::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(Capability::as_str))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_membership() {
        let set = CapabilitySet::empty()
            .with(Capability::Wedding)
            .with(Capability::Vip);

        assert!(set.contains(Capability::Wedding));
        assert!(set.contains(Capability::Vip));
        assert!(!set.contains(Capability::Corporate));
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_contains_all() {
        let driver = CapabilitySet::of(Capability::Wedding).with(Capability::Vip);
        let wedding_only = CapabilitySet::of(Capability::Wedding);
        let both = CapabilitySet::of(Capability::Wedding).with(Capability::Vip);
        let corporate = CapabilitySet::of(Capability::Corporate);

        assert!(driver.contains_all(wedding_only));
        assert!(driver.contains_all(both));
        assert!(!driver.contains_all(corporate));
        assert!(!wedding_only.contains_all(both));
    }

    #[test]
    fn test_empty_set_is_subset_of_everything() {
        let empty = CapabilitySet::empty();
        assert!(empty.contains_all(empty));
        assert!(CapabilitySet::of(Capability::Corporate).contains_all(empty));
        assert!(!empty.contains_all(CapabilitySet::of(Capability::Vip)));
    }

    #[test]
    fn test_union_and_intersects() {
        let a = CapabilitySet::of(Capability::Wedding);
        let b = CapabilitySet::of(Capability::Corporate);

        let both = a.union(b);
        assert_eq!(both.len(), 2);
        assert!(both.intersects(a));
        assert!(both.intersects(b));
        assert!(!a.intersects(b));
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let set: CapabilitySet = [Capability::EarlySetup, Capability::Wedding]
            .into_iter()
            .collect();

        let members: Vec<Capability> = set.iter().collect();
        assert_eq!(members, vec![Capability::Wedding, Capability::EarlySetup]);
    }

    #[test]
    fn test_serde_as_tag_sequence() {
        let set = CapabilitySet::of(Capability::Wedding).with(Capability::EarlySetup);

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["wedding","early_setup"]"#);

        let back: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::Vip.to_string(), "vip");
        assert_eq!(Capability::EarlySetup.to_string(), "early_setup");
    }
}
