//! Grow-only Set - elements can only be added, never removed
//! This is the simplest useful CRDT and a good starting point.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A Grow-only Set (GSet) CRDT.
///
/// The join operation is set union, which is commutative, associative, and
/// idempotent by definition. `add` returns the singleton delta.
///
/// # Example
///
/// ```rust
/// use dcrdt_core::gset::GSet;
/// use dcrdt_core::lattice::Lattice;
///
/// let mut a = GSet::new();
/// a.add("hello");
///
/// let mut b = GSet::new();
/// b.add("world");
///
/// let merged = a.join(&b);
/// assert!(merged.contains(&"hello"));
/// assert!(merged.contains(&"world"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GSet<T: Ord + Clone> {
    elements: BTreeSet<T>,
}

impl<T: Ord + Clone> GSet<T> {
    /// Create a new empty GSet.
    pub fn new() -> Self {
        Self {
            elements: BTreeSet::new(),
        }
    }

    /// Add an element (the only mutation allowed). Returns the delta.
    pub fn add(&mut self, value: T) -> Self {
        let mut delta = Self::new();
        delta.elements.insert(value.clone());
        self.elements.insert(value);
        delta
    }

    /// Check whether `value` is a member of this set.
    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    /// The current membership.
    pub fn read(&self) -> &BTreeSet<T> {
        &self.elements
    }

    /// Iterate over all elements in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    /// Return the number of elements in the set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Return `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: Ord + Clone> Default for GSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for GSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join_assign(&mut self, other: &Self) {
        self.elements.extend(other.elements.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_returns_singleton_delta() {
        let mut replica = GSet::new();
        let before = replica.clone();
        let delta = replica.add(42);

        assert_eq!(delta.read().len(), 1);
        assert!(delta.contains(&42));
        // Delta soundness: before ⊔ delta == after.
        assert_eq!(before.join(&delta), replica);
    }

    #[test]
    fn delta_shipping() {
        // Node x does initial operations, y continues from a full copy and
        // ships only its deltas back.
        let mut sx = GSet::new();
        sx.add(1);
        sx.add(4);

        let mut sy = sx.clone();
        let mut dy = sy.add(2);
        dy.join_assign(&sy.add(3));

        assert_eq!(dy.read().iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        sx.join_assign(&dy);
        assert_eq!(
            sx.read().iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn serde_round_trip() {
        let mut set = GSet::new();
        set.add("hello".to_string());
        set.add("world".to_string());

        let encoded = serde_json::to_string(&set).unwrap();
        let decoded: GSet<String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, set);
    }

    // Property-based tests for lattice laws
    proptest! {
        #[test]
        fn gset_join_is_commutative(
            a in prop::collection::btree_set(0i32..100, 0..20),
            b in prop::collection::btree_set(0i32..100, 0..20)
        ) {
            let set_a = GSet { elements: a };
            let set_b = GSet { elements: b };

            prop_assert_eq!(set_a.join(&set_b), set_b.join(&set_a));
        }

        #[test]
        fn gset_join_is_associative(
            a in prop::collection::btree_set(0i32..100, 0..10),
            b in prop::collection::btree_set(0i32..100, 0..10),
            c in prop::collection::btree_set(0i32..100, 0..10)
        ) {
            let set_a = GSet { elements: a };
            let set_b = GSet { elements: b };
            let set_c = GSet { elements: c };

            let left = set_a.join(&set_b).join(&set_c);
            let right = set_a.join(&set_b.join(&set_c));

            prop_assert_eq!(left, right);
        }

        #[test]
        fn gset_join_is_idempotent(
            a in prop::collection::btree_set(0i32..100, 0..20)
        ) {
            let set_a = GSet { elements: a };

            prop_assert_eq!(set_a.join(&set_a), set_a);
        }
    }
}
