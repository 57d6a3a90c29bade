//! PN-Counter (Positive-Negative Counter) CRDT
//!
//! Supports both increment and decrement by maintaining two grow-only
//! counters: one for increments (P) and one for decrements (N).
//! The value is P - N, so V is typically a signed type.

use crate::gcounter::{CounterValue, GCounter};
use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};

/// A Positive-Negative Counter CRDT.
///
/// # Example
///
/// ```rust
/// use dcrdt_core::pncounter::PNCounter;
/// use dcrdt_core::lattice::Lattice;
///
/// let mut hits: PNCounter<i64, &str> = PNCounter::new("n1");
/// let delta = hits.inc(10);
/// hits.dec(3);
/// assert_eq!(hits.read(), 7);
///
/// let mut mirror: PNCounter<i64, &str> = PNCounter::new("n2");
/// mirror.join_assign(&delta);
/// assert_eq!(mirror.read(), 10); // only the shipped delta arrived
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PNCounter<V: CounterValue, K: Ord + Clone> {
    p: GCounter<V, K>,
    n: GCounter<V, K>,
}

impl<V: CounterValue, K: Ord + Clone> PNCounter<V, K> {
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self {
            p: GCounter::new(id.clone()),
            n: GCounter::new(id),
        }
    }

    /// Add `amount`. Returns the delta.
    pub fn inc(&mut self, amount: V) -> Self {
        let mut delta = Self::default();
        delta.p = self.p.inc(amount);
        delta
    }

    /// Subtract `amount`. Returns the delta.
    pub fn dec(&mut self, amount: V) -> Self {
        let mut delta = Self::default();
        delta.n = self.n.inc(amount);
        delta
    }

    /// This replica's own contribution.
    pub fn local(&self) -> V {
        self.p.local() - self.n.local()
    }

    /// The counter value: increments minus decrements, over all replicas.
    pub fn read(&self) -> V {
        self.p.read() - self.n.read()
    }
}

impl<V: CounterValue, K: Ord + Clone> Default for PNCounter<V, K> {
    fn default() -> Self {
        Self {
            p: GCounter::default(),
            n: GCounter::default(),
        }
    }
}

impl<V: CounterValue, K: Ord + Clone> Lattice for PNCounter<V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.p.join_assign(&other.p);
        self.n.join_assign(&other.n);
    }
}
