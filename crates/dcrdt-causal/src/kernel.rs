//! Dot kernel - the store of active dots and their payloads
//!
//! A kernel pairs a dot store (dot → payload, one entry per *active*
//! mutation) with the causal context of everything ever observed. Removal
//! drops the store entry but keeps the dot in the context, so a join can
//! distinguish "never seen" (import it) from "seen and removed" (keep it
//! dead) without tombstones.
//!
//! All the observed-remove types in this crate are thin wrappers that pick
//! a payload type and a read function over this kernel.

use crate::context::{Dot, DotContext};
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A dot store embedded in its causal context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DotKernel<T: Clone + PartialEq, K: Ord + Clone> {
    pub(crate) store: BTreeMap<Dot<K>, T>,
    pub(crate) ctx: DotContext<K>,
}

impl<T: Clone + PartialEq, K: Ord + Clone> DotKernel<T, K> {
    pub fn new() -> Self {
        Self {
            store: BTreeMap::new(),
            ctx: DotContext::new(),
        }
    }

    /// The causal context.
    pub fn context(&self) -> &DotContext<K> {
        &self.ctx
    }

    /// Active dots and their payloads.
    pub fn iter(&self) -> impl Iterator<Item = (&Dot<K>, &T)> {
        self.store.iter()
    }

    /// Active payloads.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.store.values()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Store `value` under a fresh dot owned by `actor`. The returned delta
    /// holds just that dot: in its store and in its context.
    pub fn add(&mut self, actor: &K, value: T) -> Self {
        let dot = self.ctx.make_dot(actor);
        self.store.insert(dot.clone(), value.clone());

        let mut delta = Self::new();
        delta.store.insert(dot.clone(), value);
        delta.ctx.insert_dot(dot, true);
        delta
    }

    /// Store `value` under a fresh dot, returning the dot instead of a delta.
    pub fn dot_add(&mut self, actor: &K, value: T) -> Dot<K> {
        let dot = self.ctx.make_dot(actor);
        self.store.insert(dot.clone(), value);
        dot
    }

    /// Drop every dot whose payload equals `value`. The delta observes the
    /// removed dots in its context and stores nothing.
    pub fn remove_value(&mut self, value: &T) -> Self {
        let mut delta = Self::new();
        self.store.retain(|dot, stored| {
            if stored == value {
                delta.ctx.insert_dot(dot.clone(), false);
                false
            } else {
                true
            }
        });
        delta.ctx.compact();
        delta
    }

    /// Drop one dot, if active.
    pub fn remove_dot(&mut self, dot: &Dot<K>) -> Self {
        let mut delta = Self::new();
        if self.store.remove(dot).is_some() {
            delta.ctx.insert_dot(dot.clone(), true);
        }
        delta
    }

    /// Drop every active dot.
    pub fn remove_all(&mut self) -> Self {
        let mut delta = Self::new();
        for dot in std::mem::take(&mut self.store).into_keys() {
            delta.ctx.insert_dot(dot, false);
        }
        delta.ctx.compact();
        delta
    }

    /// Kernel merge over mergeable payloads: like the lattice join, except
    /// a dot active on both sides with diverged payloads joins them. Lifts
    /// the kernel from a set of observations to a map of mergeable slots,
    /// which is what the Bag needs.
    pub fn deep_join_assign(&mut self, other: &Self)
    where
        T: Lattice,
    {
        let ctx = &self.ctx;
        let other_ctx = &other.ctx;
        self.store
            .retain(|dot, _| other.store.contains_key(dot) || !other_ctx.dot_in(dot));
        for (dot, value) in &other.store {
            match self.store.get_mut(dot) {
                Some(mine) => {
                    if mine != value {
                        mine.join_assign(value);
                    }
                }
                None => {
                    if !ctx.dot_in(dot) {
                        self.store.insert(dot.clone(), value.clone());
                    }
                }
            }
        }
        self.ctx.join_assign(&other.ctx);
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> Default for DotKernel<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> Lattice for DotKernel<T, K> {
    fn bottom() -> Self {
        Self::new()
    }

    /// The central merge. For a dot active on one side only, the other
    /// side's context decides: observed means causally removed (drop it),
    /// unobserved means news (import it). Dots active on both sides carry
    /// identical payloads by construction.
    fn join_assign(&mut self, other: &Self) {
        let ctx = &self.ctx;
        let other_ctx = &other.ctx;
        self.store
            .retain(|dot, _| other.store.contains_key(dot) || !other_ctx.dot_in(dot));
        for (dot, value) in &other.store {
            if !self.store.contains_key(dot) && !ctx.dot_in(dot) {
                self.store.insert(dot.clone(), value.clone());
            }
        }
        self.ctx.join_assign(&other.ctx);
    }
}

// The store is keyed by dots, which most formats cannot use as map keys,
// so kernels serialize as an entry list next to the context.
impl<T, K> Serialize for DotKernel<T, K>
where
    T: Clone + PartialEq + Serialize,
    K: Ord + Clone + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Encoded<'a, T, K: Ord + Clone + Serialize> {
            store: Vec<(&'a Dot<K>, &'a T)>,
            ctx: &'a DotContext<K>,
        }

        Encoded {
            store: self.store.iter().collect(),
            ctx: &self.ctx,
        }
        .serialize(serializer)
    }
}

impl<'de, T, K> Deserialize<'de> for DotKernel<T, K>
where
    T: Clone + PartialEq + Deserialize<'de>,
    K: Ord + Clone + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Encoded<T, K: Ord + Clone> {
            store: Vec<(Dot<K>, T)>,
            ctx: DotContext<K>,
        }

        let encoded = Encoded::deserialize(deserializer)?;
        Ok(Self {
            store: encoded.store.into_iter().collect(),
            ctx: encoded.ctx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcrdt_core::lattice::join;

    #[test]
    fn add_produces_single_dot_delta() {
        let mut k: DotKernel<&str, &str> = DotKernel::new();
        let before = k.clone();
        let delta = k.add(&"r1", "v");

        assert_eq!(delta.len(), 1);
        assert!(delta.ctx.dot_in(&Dot::new("r1", 1)));
        assert_eq!(join(&before, &delta), k);
    }

    #[test]
    fn removal_is_tombstone_free() {
        let mut k: DotKernel<&str, &str> = DotKernel::new();
        k.add(&"r1", "v");
        let delta = k.remove_value(&"v");

        assert!(k.is_empty());
        assert!(delta.store.is_empty());
        // The delta context observed the dead dot.
        assert!(delta.ctx.dot_in(&Dot::new("r1", 1)));
    }

    #[test]
    fn join_does_not_resurrect_removed_dots() {
        let mut a: DotKernel<&str, &str> = DotKernel::new();
        a.add(&"r1", "v");
        let mut b = a.clone();

        // b removes; a still holds the dot. After merging the removal
        // delta into a, the dot must stay dead.
        let removal = b.remove_value(&"v");
        a.join_assign(&removal);
        assert!(a.is_empty());
        assert!(a.ctx.dot_in(&Dot::new("r1", 1)));

        // Re-receiving the original add changes nothing.
        let mut stale: DotKernel<&str, &str> = DotKernel::new();
        stale.add(&"r1", "v");
        a.join_assign(&stale);
        assert!(a.is_empty());
    }

    #[test]
    fn join_imports_unseen_dots() {
        let mut a: DotKernel<&str, &str> = DotKernel::new();
        let mut b: DotKernel<&str, &str> = DotKernel::new();
        a.add(&"r1", "x");
        b.add(&"r2", "y");

        a.join_assign(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(join(&a, &b), join(&b, &a));
    }

    #[test]
    fn remove_dot_drops_exactly_one() {
        let mut k: DotKernel<&str, &str> = DotKernel::new();
        k.add(&"r1", "v");
        k.add(&"r1", "v");
        let delta = k.remove_dot(&Dot::new("r1", 1));

        assert_eq!(k.len(), 1);
        assert!(delta.ctx.dot_in(&Dot::new("r1", 1)));
        assert!(!delta.ctx.dot_in(&Dot::new("r1", 2)));
    }

    #[test]
    fn deep_join_merges_shared_dots() {
        let mut a: DotKernel<u64, &str> = DotKernel::new();
        a.add(&"r1", 1);
        let mut b = a.clone();

        // Same dot mutated to different payloads on each side.
        *a.store.get_mut(&Dot::new("r1", 1)).unwrap() = 5;
        *b.store.get_mut(&Dot::new("r1", 1)).unwrap() = 3;

        a.deep_join_assign(&b);
        assert_eq!(a.store.get(&Dot::new("r1", 1)), Some(&5));

        b.deep_join_assign(&a);
        assert_eq!(a, b);
    }

    #[test]
    fn serde_round_trip() {
        let mut k: DotKernel<String, String> = DotKernel::new();
        k.add(&"r1".to_string(), "one".to_string());
        k.add(&"r2".to_string(), "two".to_string());
        k.remove_value(&"one".to_string());

        let encoded = serde_json::to_string(&k).unwrap();
        let decoded: DotKernel<String, String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, k);
    }
}
