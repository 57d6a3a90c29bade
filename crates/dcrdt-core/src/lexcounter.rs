//! Lex Counter - per-replica (priority, value) pairs joined lexicographically
//!
//! Increments raise the value in place; decrements bump the priority so the
//! lexicographic join totally orders each replica's own observations. Without
//! the priority, a replica's concurrent snapshots carrying an inc and a dec
//! could not be ordered by max alone.

use crate::gcounter::CounterValue;
use crate::lattice::{lex_join, Lattice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A lexicographic counter CRDT.
///
/// V is typically signed; the value half of each entry joins by `max`,
/// which is safe because within one priority a replica's value only grows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LexCounter<V: CounterValue + Lattice, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    entries: BTreeMap<K, (u64, V)>,
}

impl<V: CounterValue + Lattice, K: Ord + Clone> LexCounter<V, K> {
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

    /// Add `amount` to this replica's value. Returns the delta.
    pub fn inc(&mut self, amount: V) -> Self {
        let id = self.own_id();
        let entry = self.entries.entry(id.clone()).or_default();
        entry.1 += amount;
        let mut delta = Self::default();
        delta.entries.insert(id, *entry);
        delta
    }

    /// Subtract `amount`, bumping this replica's priority. Returns the delta.
    pub fn dec(&mut self, amount: V) -> Self {
        let id = self.own_id();
        let entry = self.entries.entry(id.clone()).or_default();
        entry.0 += 1;
        entry.1 -= amount;
        let mut delta = Self::default();
        delta.entries.insert(id, *entry);
        delta
    }

    /// The counter value: the sum of the value halves.
    pub fn read(&self) -> V {
        let mut total = V::default();
        for (_, v) in self.entries.values() {
            total += *v;
        }
        total
    }
}

impl<V: CounterValue + Lattice, K: Ord + Clone> Default for LexCounter<V, K> {
    fn default() -> Self {
        Self {
            id: None,
            entries: BTreeMap::new(),
        }
    }
}

impl<V: CounterValue + Lattice, K: Ord + Clone> PartialEq for LexCounter<V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: CounterValue + Lattice, K: Ord + Clone> Eq for LexCounter<V, K> {}

impl<V: CounterValue + Lattice, K: Ord + Clone> Lattice for LexCounter<V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        for (k, v) in &other.entries {
            match self.entries.get_mut(k) {
                Some(mine) => *mine = lex_join(mine, v),
                None => {
                    self.entries.insert(k.clone(), *v);
                }
            }
        }
    }
}
