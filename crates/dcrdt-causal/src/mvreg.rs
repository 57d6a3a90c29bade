//! Multi-Value Register
//!
//! A write replaces everything the writer has observed, but concurrent
//! writes were not observed and so survive side by side until a later
//! write (or an explicit resolve) subsumes them.

use crate::context::DotContext;
use crate::embed::Embeddable;
use crate::kernel::DotKernel;
use dcrdt_core::lattice::{join, Lattice};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A multi-value register CRDT.
///
/// # Example
///
/// ```rust
/// use dcrdt_causal::MVReg;
/// use dcrdt_core::lattice::Lattice;
///
/// let mut a: MVReg<&str, &str> = MVReg::new("a");
/// let mut b: MVReg<&str, &str> = MVReg::new("b");
///
/// a.write("north");
/// b.write("south");
/// a.join_assign(&b);
/// assert_eq!(a.read().len(), 2); // concurrent writes both retained
///
/// a.write("east"); // observed both, so it replaces them
/// assert_eq!(a.read().len(), 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MVReg<V: Ord + Clone, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    kernel: DotKernel<V, K>,
}

impl<V: Ord + Clone, K: Ord + Clone> MVReg<V, K> {
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

    /// Write `value`, superseding every observed write. Returns the delta.
    pub fn write(&mut self, value: V) -> Self {
        let id = self.own_id();
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_all();
        delta.kernel.join_assign(&self.kernel.add(&id, value));
        delta
    }

    /// The set of concurrently written values.
    pub fn read(&self) -> BTreeSet<V> {
        self.kernel.values().cloned().collect()
    }

    /// Clear the register. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_all();
        delta
    }
}

impl<V: Ord + Clone + Lattice, K: Ord + Clone> MVReg<V, K> {
    /// Drop every payload dominated (under the payload lattice order) by
    /// another held payload, reducing the register to its maximals.
    /// Returns the delta.
    pub fn resolve(&mut self) -> Self {
        let mut dominated = BTreeSet::new();
        for (_, a) in self.kernel.iter() {
            for (_, b) in self.kernel.iter() {
                if a != b && &join(a, b) == b {
                    dominated.insert(a.clone());
                }
            }
        }

        let mut delta = Self::default();
        for value in dominated {
            delta.kernel.join_assign(&self.kernel.remove_value(&value));
        }
        delta
    }
}

impl<V: Ord + Clone, K: Ord + Clone> Default for MVReg<V, K> {
    fn default() -> Self {
        Self {
            id: None,
            kernel: DotKernel::new(),
        }
    }
}

impl<V: Ord + Clone, K: Ord + Clone> PartialEq for MVReg<V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.kernel == other.kernel
    }
}

impl<V: Ord + Clone, K: Ord + Clone> Eq for MVReg<V, K> {}

impl<V: Ord + Clone, K: Ord + Clone> Lattice for MVReg<V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.kernel.join_assign(&other.kernel);
    }
}

impl<V: Ord + Clone, K: Ord + Clone> Embeddable<K> for MVReg<V, K> {
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
        MVReg::reset(self)
    }
}
