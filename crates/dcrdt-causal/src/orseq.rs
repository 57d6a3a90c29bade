//! Observed-Remove Sequence
//!
//! An ordered list of (position, dot, payload) entries. Positions order
//! the list; dots make entries unique and removable without tombstones,
//! exactly as in the kernel: an entry is dead when the context knows its
//! dot but the list no longer holds it. Concurrent inserts between the
//! same neighbors get distinct positions or, failing that, distinct dots,
//! so the order stays total across replicas.

use crate::context::{Dot, DotContext};
use crate::embed::Embeddable;
use crate::position::{among, Position};
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// An observed-remove sequence CRDT.
///
/// # Example
///
/// ```rust
/// use dcrdt_causal::ORSeq;
///
/// let mut doc: ORSeq<char, &str> = ORSeq::new("me");
/// doc.push_back('b');
/// doc.push_front('a');
/// doc.push_back('c');
/// doc.insert(1, 'x');
///
/// let text: String = doc.iter().collect();
/// assert_eq!(text, "axbc");
/// ```
#[derive(Clone, Debug)]
pub struct ORSeq<T: Clone + PartialEq, K: Ord + Clone> {
    id: Option<K>,
    entries: BTreeMap<(Position, Dot<K>), T>,
    ctx: DotContext<K>,
}

impl<T: Clone + PartialEq, K: Ord + Clone> ORSeq<T, K> {
    /// Create a mutable replica owned by `id`.
    pub fn new(id: K) -> Self {
        Self {
            id: Some(id),
            entries: BTreeMap::new(),
            ctx: DotContext::new(),
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
        &self.ctx
    }

    /// The payloads in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// The payloads in sequence order, cloned.
    pub fn read(&self) -> Vec<T> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn place(&mut self, position: Position, value: T) -> Self {
        let dot = self.ctx.make_dot(&self.own_id());
        self.entries
            .insert((position.clone(), dot.clone()), value.clone());

        let mut delta = Self::default();
        delta.entries.insert((position, dot.clone()), value);
        delta.ctx.insert_dot(dot, true);
        delta
    }

    /// Append `value`. Returns the delta.
    pub fn push_back(&mut self, value: T) -> Self {
        let position = match self.entries.keys().next_back() {
            Some((last, _)) => among(last, &Position::right_edge(), 0),
            None => among(&Position::left_edge(), &Position::right_edge(), 0),
        };
        self.place(position, value)
    }

    /// Prepend `value`. Returns the delta.
    pub fn push_front(&mut self, value: T) -> Self {
        let position = match self.entries.keys().next() {
            Some((first, _)) => among(&Position::left_edge(), first, 0),
            None => among(&Position::left_edge(), &Position::right_edge(), 0),
        };
        self.place(position, value)
    }

    /// Insert `value` before the element at `index`. `index == len` appends.
    /// Returns the delta.
    ///
    /// # Panics
    ///
    /// Panics when `index > len`, like `Vec::insert`.
    pub fn insert(&mut self, index: usize, value: T) -> Self {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        if index == len {
            return self.push_back(value);
        }
        if index == 0 {
            return self.push_front(value);
        }
        let left = match self.entries.keys().nth(index - 1) {
            Some((position, _)) => position.clone(),
            None => Position::left_edge(),
        };
        let right = match self.entries.keys().nth(index) {
            Some((position, _)) => position.clone(),
            None => Position::right_edge(),
        };
        let position = among(&left, &right, 0);
        self.place(position, value)
    }

    /// Remove the element at `index`. The delta observes the removed dot
    /// in its context. Returns the delta.
    ///
    /// # Panics
    ///
    /// Panics when `index >= len`, like `Vec::remove`.
    pub fn remove(&mut self, index: usize) -> Self {
        let len = self.len();
        let key = match self.entries.keys().nth(index) {
            Some(key) => key.clone(),
            None => panic!("removal index (is {index}) should be < len (is {len})"),
        };
        self.entries.remove(&key);

        let mut delta = Self::default();
        delta.ctx.insert_dot(key.1, true);
        delta
    }

    /// Remove every element. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        for ((_, dot), _) in std::mem::take(&mut self.entries) {
            delta.ctx.insert_dot(dot, false);
        }
        delta.ctx.compact();
        delta
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> Default for ORSeq<T, K> {
    fn default() -> Self {
        Self {
            id: None,
            entries: BTreeMap::new(),
            ctx: DotContext::new(),
        }
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> PartialEq for ORSeq<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.ctx == other.ctx && self.entries == other.entries
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> Lattice for ORSeq<T, K> {
    fn bottom() -> Self {
        Self::default()
    }

    /// The kernel walk keyed by (position, dot): entries die where the
    /// other context observed their dot, import where ours did not.
    fn join_assign(&mut self, other: &Self) {
        let other_ctx = &other.ctx;
        self.entries
            .retain(|key, _| other.entries.contains_key(key) || !other_ctx.dot_in(&key.1));
        for (key, value) in &other.entries {
            if !self.entries.contains_key(key) && !self.ctx.dot_in(&key.1) {
                self.entries.insert(key.clone(), value.clone());
            }
        }
        self.ctx.join_assign(&other.ctx);
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> Embeddable<K> for ORSeq<T, K> {
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
        ORSeq::reset(self)
    }
}

impl<T, K> Serialize for ORSeq<T, K>
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
            entries: Vec<(&'a Position, &'a Dot<K>, &'a T)>,
            ctx: &'a DotContext<K>,
        }

        Encoded {
            entries: self
                .entries
                .iter()
                .map(|((position, dot), value)| (position, dot, value))
                .collect(),
            ctx: &self.ctx,
        }
        .serialize(serializer)
    }
}

impl<'de, T, K> Deserialize<'de> for ORSeq<T, K>
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
            entries: Vec<(Position, Dot<K>, T)>,
            ctx: DotContext<K>,
        }

        let encoded = Encoded::deserialize(deserializer)?;
        Ok(Self {
            id: None,
            entries: encoded
                .entries
                .into_iter()
                .map(|(position, dot, value)| ((position, dot), value))
                .collect(),
            ctx: encoded.ctx,
        })
    }
}
