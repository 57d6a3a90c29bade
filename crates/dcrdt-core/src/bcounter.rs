//! Bounded Counter - a PN-counter with decentralized quota enforcement
//!
//! Each replica may only decrement what it locally holds. Capacity moves
//! between replicas through a grow-only map of directed transfers, so
//! `local()` stays non-negative at every replica without coordination.

use crate::gcounter::CounterValue;
use crate::gmap::GMap;
use crate::lattice::Lattice;
use crate::pncounter::PNCounter;
use serde::{Deserialize, Serialize};

/// A bounded counter CRDT.
///
/// `dec` and `mv` beyond the local capacity are silent no-ops that return
/// the neutral delta; callers observe the outcome through [`BCounter::local`].
///
/// # Example
///
/// ```rust
/// use dcrdt_core::bcounter::BCounter;
///
/// let mut quota: BCounter<i64, &str> = BCounter::new("a");
/// quota.inc(10);
/// quota.dec(15); // over budget: refused
/// assert_eq!(quota.local(), 10);
///
/// quota.mv(4, "b");
/// assert_eq!(quota.local(), 6);
/// assert_eq!(quota.read(), 10);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    #[serde(skip)]
    id: Option<K>,
    counts: PNCounter<V, K>,
    transfers: GMap<(K, K), V>,
}

impl<V, K> BCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self {
            id: Some(id.clone()),
            counts: PNCounter::new(id),
            transfers: GMap::new(),
        }
    }

    fn own_id(&self) -> K {
        match &self.id {
            Some(id) => id.clone(),
            None => panic!("mutation on an anonymous counter delta"),
        }
    }

    /// Add `amount` of capacity at this replica. Returns the delta.
    pub fn inc(&mut self, amount: V) -> Self {
        let mut delta = Self::default();
        delta.counts = self.counts.inc(amount);
        delta
    }

    /// Consume `amount` of local capacity. No-op when `amount > local()`.
    pub fn dec(&mut self, amount: V) -> Self {
        let mut delta = Self::default();
        if amount <= self.local() {
            delta.counts = self.counts.dec(amount);
        }
        delta
    }

    /// Transfer `quantity` of local capacity to replica `to`.
    /// No-op when `quantity > local()`.
    pub fn mv(&mut self, quantity: V, to: K) -> Self {
        let mut delta = Self::default();
        if quantity <= self.local() {
            let from = self.own_id();
            let entry = self.transfers.entry((from.clone(), to.clone()));
            *entry += quantity;
            let total = *entry;
            *delta.transfers.entry((from, to)) = total;
        }
        delta
    }

    /// The global counter value.
    pub fn read(&self) -> V {
        self.counts.read()
    }

    /// The capacity this replica may still consume: its own contribution
    /// plus incoming transfers minus outgoing transfers.
    pub fn local(&self) -> V {
        let mut res = self.counts.local();
        if let Some(id) = &self.id {
            for ((from, to), q) in self.transfers.iter() {
                if to == id {
                    res += *q;
                }
                if from == id {
                    res -= *q;
                }
            }
        }
        res
    }
}

impl<V, K> Default for BCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    fn default() -> Self {
        Self {
            id: None,
            counts: PNCounter::default(),
            transfers: GMap::new(),
        }
    }
}

impl<V, K> PartialEq for BCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts && self.transfers == other.transfers
    }
}

impl<V, K> Eq for BCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
}

impl<V, K> Lattice for BCounter<V, K>
where
    V: CounterValue + Lattice,
    K: Ord + Clone,
{
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.counts.join_assign(&other.counts);
        self.transfers.join_assign(&other.transfers);
    }
}
