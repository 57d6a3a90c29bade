//! Reset-Wins Counter
//!
//! A bag of (inc_total, dec_total) pairs, one slot per replica. Reset
//! removes the observed slots, taking their whole contribution with them:
//! against a concurrent increment in an observed slot, the reset wins.
//! A replica that calls `fresh` first puts its increment in a slot the
//! reset never observed, and the increment survives.

use crate::bag::Bag;
use crate::context::DotContext;
use crate::embed::Embeddable;
use dcrdt_core::gcounter::CounterValue;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};

/// A reset-wins counter CRDT.
///
/// The slot totals only grow, so the pair's componentwise `max` join makes
/// concurrent updates to the same slot meet correctly in the bag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RWCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    bag: Bag<(V, V), K>,
}

impl<V, K> RWCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self { bag: Bag::new(id) }
    }

    /// The causal context.
    pub fn context(&self) -> &DotContext<K> {
        self.bag.context()
    }

    /// Add `amount` to this replica's slot. Returns the delta.
    pub fn inc(&mut self, amount: V) -> Self {
        self.bag.my_data().0 += amount;
        let mut delta = Self::default();
        let dot = self.bag.my_dot();
        let data = self.bag.my_data().clone();
        delta.bag.insert(dot, data);
        delta
    }

    /// Add `amount` to this replica's decrement total. Returns the delta.
    pub fn dec(&mut self, amount: V) -> Self {
        self.bag.my_data().1 += amount;
        let mut delta = Self::default();
        let dot = self.bag.my_dot();
        let data = self.bag.my_data().clone();
        delta.bag.insert(dot, data);
        delta
    }

    /// Open a fresh slot so that subsequent updates survive resets
    /// prepared concurrently.
    pub fn fresh(&mut self) {
        self.bag.fresh();
    }

    /// Remove every observed slot. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        delta.bag = self.bag.reset();
        delta
    }

    /// The counter value: increments minus decrements over all slots.
    pub fn read(&self) -> V {
        let mut inc_total = V::default();
        let mut dec_total = V::default();
        for (_, (p, n)) in self.bag.iter() {
            inc_total += *p;
            dec_total += *n;
        }
        inc_total - dec_total
    }
}

impl<V, K> Default for RWCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    fn default() -> Self {
        Self {
            bag: Bag::default(),
        }
    }
}

impl<V, K> Lattice for RWCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.bag.join_assign(&other.bag);
    }
}

impl<V, K> Embeddable<K> for RWCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    fn with_id(id: K) -> Self {
        Self::new(id)
    }

    fn context(&self) -> &DotContext<K> {
        self.bag.context()
    }

    fn context_mut(&mut self) -> &mut DotContext<K> {
        self.bag.context_mut()
    }

    fn reset(&mut self) -> Self {
        RWCounter::reset(self)
    }
}
