//! Remove-Wins Observed-Remove Set
//!
//! Payloads are (value, added?) pairs: adds and removes both leave a
//! token. A value is a member only when every observed token says added,
//! so a concurrent remove beats a concurrent add.

use crate::context::DotContext;
use crate::embed::Embeddable;
use crate::kernel::DotKernel;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A remove-wins observed-remove set CRDT.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RWORSet<E: Ord + Clone, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    kernel: DotKernel<(E, bool), K>,
}

impl<E: Ord + Clone, K: Ord + Clone> RWORSet<E, K> {
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

    /// The current membership: values whose every token is an add.
    pub fn read(&self) -> BTreeSet<E> {
        let mut tokens: BTreeMap<&E, bool> = BTreeMap::new();
        for (value, added) in self.kernel.values() {
            tokens
                .entry(value)
                .and_modify(|t| *t &= added)
                .or_insert(*added);
        }
        tokens
            .into_iter()
            .filter(|(_, added)| *added)
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Check whether `value` is currently a member.
    pub fn contains(&self, value: &E) -> bool {
        let mut seen = false;
        for (v, added) in self.kernel.values() {
            if v == value {
                if !added {
                    return false;
                }
                seen = true;
            }
        }
        seen
    }

    fn refresh(&mut self, value: &E, added: bool) -> Self {
        let id = self.own_id();
        let mut delta = Self::default();
        // Withdraw both kinds of observed token before leaving the new one.
        delta.kernel = self.kernel.remove_value(&(value.clone(), true));
        delta
            .kernel
            .join_assign(&self.kernel.remove_value(&(value.clone(), false)));
        delta
            .kernel
            .join_assign(&self.kernel.add(&id, (value.clone(), added)));
        delta
    }

    /// Add `value`. Returns the delta.
    pub fn add(&mut self, value: E) -> Self {
        self.refresh(&value, true)
    }

    /// Remove `value`, leaving a remove token that beats concurrent adds.
    /// Returns the delta.
    pub fn rmv(&mut self, value: &E) -> Self {
        self.refresh(value, false)
    }

    /// Remove everything observed. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_all();
        delta
    }
}

impl<E: Ord + Clone, K: Ord + Clone> Default for RWORSet<E, K> {
    fn default() -> Self {
        Self {
            id: None,
            kernel: DotKernel::new(),
        }
    }
}

impl<E: Ord + Clone, K: Ord + Clone> PartialEq for RWORSet<E, K> {
    fn eq(&self, other: &Self) -> bool {
        self.kernel == other.kernel
    }
}

impl<E: Ord + Clone, K: Ord + Clone> Eq for RWORSet<E, K> {}

impl<E: Ord + Clone, K: Ord + Clone> Lattice for RWORSet<E, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.kernel.join_assign(&other.kernel);
    }
}

impl<E: Ord + Clone, K: Ord + Clone> Embeddable<K> for RWORSet<E, K> {
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
        RWORSet::reset(self)
    }
}
