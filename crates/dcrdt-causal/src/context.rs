//! Dots and the causal context
//!
//! A dot uniquely names one mutation: the replica that performed it plus
//! that replica's local sequence number. The causal context is the set of
//! every dot a replica has ever observed, stored compactly as a dense
//! per-replica prefix plus a sparse cloud of out-of-order dots.
//!
//! The context is the half of the tombstone-free encoding that remembers
//! deletions: a dot present in the context but absent from a dot store is
//! a causally observed removal.

use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A globally unique event identifier: (replica, local sequence number).
///
/// Sequence numbers start at 1; each replica allocates its own in order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dot<K: Ord + Clone> {
    pub actor: K,
    pub counter: u64,
}

impl<K: Ord + Clone> Dot<K> {
    pub fn new(actor: K, counter: u64) -> Self {
        Self { actor, counter }
    }
}

/// The set of causally known dots, compacted.
///
/// `prefix[k] = n` records that all dots `(k, 1..=n)` are known; `cloud`
/// holds known dots not yet contiguous with the prefix. [`DotContext::compact`]
/// migrates cloud dots into the prefix whenever they become contiguous and
/// prunes dots the prefix already dominates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotContext<K: Ord + Clone> {
    prefix: BTreeMap<K, u64>,
    cloud: BTreeSet<Dot<K>>,
}

impl<K: Ord + Clone> DotContext<K> {
    pub fn new() -> Self {
        Self {
            prefix: BTreeMap::new(),
            cloud: BTreeSet::new(),
        }
    }

    /// Has this dot been observed?
    pub fn dot_in(&self, dot: &Dot<K>) -> bool {
        if let Some(n) = self.prefix.get(&dot.actor) {
            if dot.counter <= *n {
                return true;
            }
        }
        self.cloud.contains(dot)
    }

    /// The dense prefix observed for `actor`.
    pub fn prefix_of(&self, actor: &K) -> u64 {
        self.prefix.get(actor).copied().unwrap_or(0)
    }

    /// The out-of-order dots.
    pub fn cloud(&self) -> &BTreeSet<Dot<K>> {
        &self.cloud
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.cloud.is_empty()
    }

    /// Allocate the next dot for `actor` and record it.
    ///
    /// Valid dot generators keep all of their own dots in the prefix, so
    /// allocation is a prefix bump, never a cloud insertion.
    pub fn make_dot(&mut self, actor: &K) -> Dot<K> {
        let n = self.prefix.entry(actor.clone()).or_insert(0);
        *n += 1;
        Dot::new(actor.clone(), *n)
    }

    /// Record an externally produced dot, optionally compacting right away.
    ///
    /// Deferring compaction is useful when inserting many dots in a row.
    pub fn insert_dot(&mut self, dot: Dot<K>, compact_now: bool) {
        self.cloud.insert(dot);
        if compact_now {
            self.compact();
        }
    }

    /// Migrate contiguous cloud dots into the prefix and drop dominated
    /// ones, iterating to a fixpoint. Pure rewrite: observes the same dots
    /// before and after.
    pub fn compact(&mut self) {
        // One migration can unlock another, so loop until nothing moves.
        let mut again = true;
        while again {
            again = false;
            let mut keep = BTreeSet::new();
            for dot in std::mem::take(&mut self.cloud) {
                let n = self.prefix.entry(dot.actor.clone()).or_insert(0);
                if dot.counter == *n + 1 {
                    *n += 1;
                    again = true;
                } else if dot.counter > *n {
                    keep.insert(dot);
                }
                // dominated dots are dropped
            }
            self.cloud = keep;
        }
        self.prefix.retain(|_, n| *n > 0);
    }
}

impl<K: Ord + Clone> Default for DotContext<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> Lattice for DotContext<K> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join_assign(&mut self, other: &Self) {
        for (actor, n) in &other.prefix {
            match self.prefix.get_mut(actor) {
                Some(mine) => {
                    if *n > *mine {
                        *mine = *n;
                    }
                }
                None => {
                    self.prefix.insert(actor.clone(), *n);
                }
            }
        }
        for dot in &other.cloud {
            self.cloud.insert(dot.clone());
        }
        self.compact();
    }
}
