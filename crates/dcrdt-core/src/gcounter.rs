//! Grow-only Counter - per-replica monotone counts joined by max
//!
//! Each replica owns one entry and only ever raises it, so the per-key max
//! join converges. The counter value is the sum over all entries.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Value types the counters can count in: ordered, copyable arithmetic.
///
/// Blanket-implemented for the integer primitives; `Default` is the zero.
pub trait CounterValue:
    Copy
    + Default
    + Ord
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
{
}

impl<T> CounterValue for T where
    T: Copy
        + Default
        + Ord
        + Add<Output = T>
        + AddAssign
        + Sub<Output = T>
        + SubAssign
{
}

/// A Grow-only Counter (GCounter) CRDT.
///
/// Mutable replicas are built with [`GCounter::new`] and hold their replica
/// id; values obtained via `Default` are neutral deltas and must not be
/// mutated. The id is local configuration: it is not replicated, compared,
/// or serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "V: Serialize, K: Serialize + Ord + Clone",
    deserialize = "V: Deserialize<'de>, K: Deserialize<'de> + Ord + Clone"
))]
pub struct GCounter<V: CounterValue, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    entries: BTreeMap<K, V>,
}

impl<V: CounterValue, K: Ord + Clone> GCounter<V, K> {
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self {
            id: Some(id),
            entries: BTreeMap::new(),
        }
    }

    fn own_id(&self) -> K {
        match &self.id {
            Some(id) => id.clone(),
            None => panic!("mutation on an anonymous counter delta"),
        }
    }

    /// Add `amount` to this replica's entry. Returns the delta, which
    /// carries only the mutated entry.
    pub fn inc(&mut self, amount: V) -> Self {
        let id = self.own_id();
        let entry = self.entries.entry(id.clone()).or_default();
        *entry += amount;
        let mut delta = Self::default();
        delta.entries.insert(id, *entry);
        delta
    }

    /// This replica's own count.
    pub fn local(&self) -> V {
        match &self.id {
            Some(id) => self.entries.get(id).copied().unwrap_or_default(),
            None => V::default(),
        }
    }

    /// The counter value: the sum over all replicas.
    pub fn read(&self) -> V {
        let mut total = V::default();
        for v in self.entries.values() {
            total += *v;
        }
        total
    }

    /// Per-replica entries.
    pub fn entries(&self) -> &BTreeMap<K, V> {
        &self.entries
    }
}

impl<V: CounterValue, K: Ord + Clone> Default for GCounter<V, K> {
    fn default() -> Self {
        Self {
            id: None,
            entries: BTreeMap::new(),
        }
    }
}

// Equality is over replicated state only; the replica id is configuration.
impl<V: CounterValue, K: Ord + Clone> PartialEq for GCounter<V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: CounterValue, K: Ord + Clone> Eq for GCounter<V, K> {}

impl<V: CounterValue, K: Ord + Clone> Lattice for GCounter<V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        for (k, v) in &other.entries {
            match self.entries.get_mut(k) {
                Some(mine) => {
                    if *v > *mine {
                        *mine = *v;
                    }
                }
                None => {
                    self.entries.insert(k.clone(), *v);
                }
            }
        }
    }
}
