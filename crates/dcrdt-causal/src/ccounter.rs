//! Causal Counter
//!
//! Each replica keeps (at most) one active dot holding its current signed
//! contribution; every inc/dec supersedes the replica's own dots with a
//! fresh one. Reset removes all observed dots, but an unobserved
//! contribution made concurrently survives it.

use crate::context::{Dot, DotContext};
use crate::embed::Embeddable;
use crate::kernel::DotKernel;
use dcrdt_core::gcounter::CounterValue;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};

/// A causal counter CRDT. V is typically signed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CCounter<V: CounterValue, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    kernel: DotKernel<V, K>,
}

impl<V: CounterValue, K: Ord + Clone> CCounter<V, K> {
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self {
            id: Some(id),
            kernel: DotKernel::new(),
        }
    }

    fn own_id(&self) -> K {
        match &self.id {
            Some(id) => id.clone(),
            None => panic!("mutation on an anonymous delta value"),
        }
    }

    /// The causal context.
    pub fn context(&self) -> &DotContext<K> {
        self.kernel.context()
    }

    /// Replace this replica's dots with one holding `base ± amount`.
    fn shift(&mut self, up: bool, amount: V) -> Self {
        let id = self.own_id();
        let own: Vec<Dot<K>> = self
            .kernel
            .iter()
            .filter(|(dot, _)| dot.actor == id)
            .map(|(dot, _)| dot.clone())
            .collect();
        // Normally a single dot; several can accumulate through joins of
        // deltas produced before older ones were observed.
        let base = self
            .kernel
            .iter()
            .filter(|(dot, _)| dot.actor == id)
            .map(|(_, v)| *v)
            .max()
            .unwrap_or_default();

        let mut delta = Self::default();
        for dot in own {
            delta.kernel.join_assign(&self.kernel.remove_dot(&dot));
        }
        let next = if up { base + amount } else { base - amount };
        delta.kernel.join_assign(&self.kernel.add(&id, next));
        delta
    }

    /// Add `amount` to this replica's contribution. Returns the delta.
    pub fn inc(&mut self, amount: V) -> Self {
        self.shift(true, amount)
    }

    /// Subtract `amount` from this replica's contribution. Returns the delta.
    pub fn dec(&mut self, amount: V) -> Self {
        self.shift(false, amount)
    }

    /// Remove every observed dot. Contributions made concurrently survive.
    /// Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_all();
        delta
    }

    /// The counter value: the sum over all active dots.
    pub fn read(&self) -> V {
        let mut total = V::default();
        for v in self.kernel.values() {
            total += *v;
        }
        total
    }
}

impl<V: CounterValue, K: Ord + Clone> Default for CCounter<V, K> {
    fn default() -> Self {
        Self {
            id: None,
            kernel: DotKernel::new(),
        }
    }
}

impl<V: CounterValue, K: Ord + Clone> PartialEq for CCounter<V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.kernel == other.kernel
    }
}

impl<V: CounterValue, K: Ord + Clone> Eq for CCounter<V, K> {}

impl<V: CounterValue, K: Ord + Clone> Lattice for CCounter<V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.kernel.join_assign(&other.kernel);
    }
}

impl<V: CounterValue, K: Ord + Clone> Embeddable<K> for CCounter<V, K> {
    fn with_id(id: K) -> Self {
        Self::new(id)
    }

    fn context(&self) -> &DotContext<K> {
        self.kernel.context()
    }

    fn context_mut(&mut self) -> &mut DotContext<K> {
        &mut self.kernel.ctx
    }

    fn reset(&mut self) -> Self {
        CCounter::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inc_dec_converge() {
        let mut x: CCounter<i64, &str> = CCounter::new("a");
        let mut y: CCounter<i64, &str> = CCounter::new("b");

        x.inc(4);
        x.dec(1);
        y.dec(1);

        assert_ne!(x.read(), y.read());

        let xd = x.clone();
        x.join_assign(&y);
        y.join_assign(&xd);
        assert_eq!(x.read(), y.read());
        assert_eq!(x.read(), 2);
    }

    #[test]
    fn own_dots_are_superseded() {
        let mut x: CCounter<i64, &str> = CCounter::new("a");
        x.inc(10);
        x.inc(1);
        x.dec(1);
        // One active dot with the folded contribution.
        assert_eq!(x.kernel.len(), 1);
        assert_eq!(x.read(), 10);
    }

    #[test]
    fn observed_reset_zeroes() {
        let mut x: CCounter<i64, &str> = CCounter::new("x");
        let mut y: CCounter<i64, &str> = CCounter::new("y");

        x.inc(1);
        y.join_assign(&x);
        let reset = y.reset();

        x.join_assign(&reset);
        assert_eq!(x.read(), 0);
    }

    #[test]
    fn concurrent_inc_survives_reset() {
        let mut x: CCounter<i64, &str> = CCounter::new("x");
        let mut y: CCounter<i64, &str> = CCounter::new("y");

        x.inc(10);
        y.join_assign(&x);
        y.inc(10);
        let reset = y.reset(); // observed both contributions

        // Concurrently with the reset, x moves to 11: its new dot is
        // unobserved and survives, its old dot dies.
        x.inc(1);
        x.join_assign(&reset);
        assert_eq!(x.read(), 11);
    }

    #[test]
    fn delta_soundness() {
        let mut c: CCounter<i64, &str> = CCounter::new("r");
        c.inc(5);
        let before = c.clone();
        let delta = c.dec(2);
        assert_eq!(before.join(&delta), c);
        assert_eq!(c.read(), 3);
    }

    #[test]
    fn serde_round_trip() {
        let mut c: CCounter<i64, String> = CCounter::new("r".to_string());
        c.inc(7);
        let encoded = serde_json::to_string(&c).unwrap();
        let decoded: CCounter<i64, String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, c);
    }
}
