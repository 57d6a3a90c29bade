//! Observed-Remove Map of embedded CRDTs
//!
//! One causal context serves the whole map: every dot allocated under any
//! key lands in it, so erasing a key can be told apart from never having
//! seen it without tombstoning the key set. Entries hold empty context
//! slots at rest; [`ORMap::entry`] lends the map context to a value behind
//! an RAII guard for the duration of a mutation and reclaims it on drop.
//!
//! Deltas produced through the guard own fresh contexts describing only
//! the change, so they ship without the map, like any other delta.

use crate::context::DotContext;
use crate::embed::Embeddable;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::mem;
use std::ops::{Deref, DerefMut};

/// A map from keys to embedded causal CRDTs sharing one context.
///
/// # Example
///
/// ```rust
/// use dcrdt_causal::{AWORSet, ORMap};
/// use dcrdt_core::lattice::Lattice;
///
/// let mut prefs: ORMap<&str, AWORSet<&str, &str>, &str> = ORMap::new("a");
/// prefs.entry("color").add("red");
///
/// let mut mirror: ORMap<&str, AWORSet<&str, &str>, &str> = ORMap::new("b");
/// mirror.join_assign(&prefs);
///
/// let erase = prefs.erase(&"color");
/// mirror.join_assign(&erase);
/// assert!(mirror.get(&"color").map_or(true, |v| v.read().is_empty()));
/// ```
#[derive(Clone, Debug)]
pub struct ORMap<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> {
    id: Option<K>,
    ctx: DotContext<K>,
    entries: BTreeMap<N, V>,
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> ORMap<N, V, K> {
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self {
            id: Some(id),
            ctx: DotContext::new(),
            entries: BTreeMap::new(),
        }
    }

    /// The map-wide causal context.
    pub fn context(&self) -> &DotContext<K> {
        &self.ctx
    }

    fn blank_value(&self) -> V {
        match &self.id {
            Some(id) => V::with_id(id.clone()),
            None => V::default(),
        }
    }

    /// Read access to the value under `key`, if present.
    ///
    /// Read operations on embedded values do not consult the context, so
    /// no lending is needed here.
    pub fn get(&self, key: &N) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable access to the value under `key`, inserting a fresh one if
    /// absent. The returned guard carries the map context into the value;
    /// deltas returned by mutations through the guard are self-contained.
    pub fn entry(&mut self, key: N) -> EntryMut<'_, N, V, K> {
        let blank = self.blank_value();
        let value = self.entries.entry(key.clone()).or_insert(blank);
        mem::swap(value.context_mut(), &mut self.ctx);
        EntryMut { map: self, key }
    }

    /// Erase `key`: reset the entry, keep its dots in the delta context,
    /// drop the entry locally. Returns the delta.
    pub fn erase(&mut self, key: &N) -> Self {
        let mut delta = Self::default();
        if let Some(mut value) = self.entries.remove(key) {
            mem::swap(value.context_mut(), &mut self.ctx);
            let mut collected = value.reset();
            mem::swap(value.context_mut(), &mut self.ctx);
            delta.ctx = mem::take(collected.context_mut());
        }
        delta
    }

    /// Erase every key. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        for (_, mut value) in mem::take(&mut self.entries) {
            mem::swap(value.context_mut(), &mut self.ctx);
            let mut collected = value.reset();
            mem::swap(value.context_mut(), &mut self.ctx);
            delta.ctx.join_assign(collected.context_mut());
        }
        delta
    }

    /// Keys with entries, erased keys excluded (an entry emptied by a
    /// remote erase still lists until trimmed by its own erase).
    pub fn keys(&self) -> impl Iterator<Item = &N> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> Default for ORMap<N, V, K> {
    fn default() -> Self {
        Self {
            id: None,
            ctx: DotContext::new(),
            entries: BTreeMap::new(),
        }
    }
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> PartialEq for ORMap<N, V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.ctx == other.ctx && self.entries == other.entries
    }
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> Lattice for ORMap<N, V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        // Each per-key join must see the map contexts as they were before
        // this merge started, not polluted by earlier keys' joins.
        let snapshot = self.ctx.clone();

        let keys: std::collections::BTreeSet<N> = self
            .entries
            .keys()
            .chain(other.entries.keys())
            .cloned()
            .collect();
        for key in keys {
            // A key absent on the other side still joins, against an empty
            // value carrying the other context: dots the other side has
            // observed (and erased) must die here.
            let mut remote = match other.entries.get(&key) {
                Some(value) => value.clone(),
                None => self.blank_value(),
            };
            *remote.context_mut() = other.ctx.clone();

            let blank = self.blank_value();
            let value = self.entries.entry(key).or_insert(blank);
            mem::swap(value.context_mut(), &mut self.ctx);
            value.join_assign(&remote);
            mem::swap(value.context_mut(), &mut self.ctx);
            self.ctx = snapshot.clone();
        }

        self.ctx.join_assign(&other.ctx);
    }
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> Embeddable<K> for ORMap<N, V, K> {
    fn with_id(id: K) -> Self {
        Self::new(id)
    }

    fn context(&self) -> &DotContext<K> {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut DotContext<K> {
        &mut self.ctx
    }

    fn reset(&mut self) -> Self {
        ORMap::reset(self)
    }
}

/// Mutable access to one map entry, holding the lent map context.
///
/// While the guard lives, the entry's context *is* the map context; the
/// guard's drop hands it back. Dropping the guard is therefore not
/// optional bookkeeping but what re-establishes the map invariant.
pub struct EntryMut<'a, N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> {
    map: &'a mut ORMap<N, V, K>,
    key: N,
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> Deref for EntryMut<'_, N, V, K> {
    type Target = V;

    fn deref(&self) -> &V {
        self.map
            .entries
            .get(&self.key)
            .expect("guarded entry exists")
    }
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> DerefMut for EntryMut<'_, N, V, K> {
    fn deref_mut(&mut self) -> &mut V {
        self.map
            .entries
            .get_mut(&self.key)
            .expect("guarded entry exists")
    }
}

impl<N: Ord + Clone, V: Embeddable<K>, K: Ord + Clone> Drop for EntryMut<'_, N, V, K> {
    fn drop(&mut self) {
        let ctx = &mut self.map.ctx;
        if let Some(value) = self.map.entries.get_mut(&self.key) {
            mem::swap(value.context_mut(), ctx);
        }
    }
}

impl<N, V, K> Serialize for ORMap<N, V, K>
where
    N: Ord + Clone + Serialize,
    V: Embeddable<K> + Serialize,
    K: Ord + Clone + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Encoded<'a, N, V, K: Ord + Clone + Serialize> {
            entries: Vec<(&'a N, &'a V)>,
            ctx: &'a DotContext<K>,
        }

        Encoded {
            entries: self.entries.iter().collect(),
            ctx: &self.ctx,
        }
        .serialize(serializer)
    }
}

impl<'de, N, V, K> Deserialize<'de> for ORMap<N, V, K>
where
    N: Ord + Clone + Deserialize<'de>,
    V: Embeddable<K> + Deserialize<'de>,
    K: Ord + Clone + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Encoded<N, V, K: Ord + Clone> {
            entries: Vec<(N, V)>,
            ctx: DotContext<K>,
        }

        let encoded = Encoded::deserialize(deserializer)?;
        Ok(Self {
            id: None,
            ctx: encoded.ctx,
            entries: encoded.entries.into_iter().collect(),
        })
    }
}
