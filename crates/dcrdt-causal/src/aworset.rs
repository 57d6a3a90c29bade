//! Add-Wins Observed-Remove Set
//!
//! Every add stores the value under a fresh dot; remove kills the observed
//! dots only. A concurrent add survives a remove because its dot was not
//! observed by the remover - add wins.

use crate::context::DotContext;
use crate::embed::Embeddable;
use crate::kernel::DotKernel;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An add-wins observed-remove set CRDT.
///
/// # Example
///
/// ```rust
/// use dcrdt_causal::AWORSet;
/// use dcrdt_core::lattice::Lattice;
///
/// let mut x: AWORSet<&str, &str> = AWORSet::new("x");
/// let mut y: AWORSet<&str, &str> = AWORSet::new("y");
///
/// x.add("apple");
/// let removal = x.rmv(&"apple");
/// y.add("apple"); // concurrent with the removal
///
/// y.join_assign(&removal);
/// assert!(y.contains(&"apple")); // the unobserved add wins
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AWORSet<E: Ord + Clone, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    kernel: DotKernel<E, K>,
}

impl<E: Ord + Clone, K: Ord + Clone> AWORSet<E, K> {
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

    /// The current membership.
    pub fn read(&self) -> BTreeSet<E> {
        self.kernel.values().cloned().collect()
    }

    /// Check whether `value` is currently a member.
    pub fn contains(&self, value: &E) -> bool {
        self.kernel.values().any(|v| v == value)
    }

    /// Add `value`. The delta removes every observed dot carrying the value
    /// first, so stale adds cannot resurrect it later. Returns the delta.
    pub fn add(&mut self, value: E) -> Self {
        let id = self.own_id();
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_value(&value);
        delta.kernel.join_assign(&self.kernel.add(&id, value));
        delta
    }

    /// Remove every observed dot carrying `value`. Returns the delta.
    pub fn rmv(&mut self, value: &E) -> Self {
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_value(value);
        delta
    }

    /// Remove everything observed. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_all();
        delta
    }
}

impl<E: Ord + Clone, K: Ord + Clone> Default for AWORSet<E, K> {
    fn default() -> Self {
        Self {
            id: None,
            kernel: DotKernel::new(),
        }
    }
}

impl<E: Ord + Clone, K: Ord + Clone> PartialEq for AWORSet<E, K> {
    fn eq(&self, other: &Self) -> bool {
        self.kernel == other.kernel
    }
}

impl<E: Ord + Clone, K: Ord + Clone> Eq for AWORSet<E, K> {}

impl<E: Ord + Clone, K: Ord + Clone> Lattice for AWORSet<E, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.kernel.join_assign(&other.kernel);
    }
}

impl<E: Ord + Clone, K: Ord + Clone> Embeddable<K> for AWORSet<E, K> {
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
        AWORSet::reset(self)
    }
}
