//! Two-Phase Set - supports removal, but a removed element never returns
//!
//! Removal is recorded in a tombstone set that dominates the present set
//! on join. Re-adding a tombstoned element is a no-op.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A Two-Phase Set (2P-Set) CRDT.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPSet<T: Ord + Clone> {
    present: BTreeSet<T>,
    tombstones: BTreeSet<T>,
}

impl<T: Ord + Clone> TwoPSet<T> {
    /// Create a new empty 2P-Set.
    pub fn new() -> Self {
        Self {
            present: BTreeSet::new(),
            tombstones: BTreeSet::new(),
        }
    }

    /// Add an element, unless it was already removed. Returns the delta.
    pub fn add(&mut self, value: T) -> Self {
        let mut delta = Self::new();
        if !self.tombstones.contains(&value) {
            self.present.insert(value.clone());
            delta.present.insert(value);
        }
        delta
    }

    /// Remove an element permanently. Returns the delta.
    pub fn rmv(&mut self, value: T) -> Self {
        let mut delta = Self::new();
        self.present.remove(&value);
        self.tombstones.insert(value.clone());
        delta.tombstones.insert(value);
        delta
    }

    /// Tombstone every present element. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::new();
        for value in std::mem::take(&mut self.present) {
            self.tombstones.insert(value.clone());
            delta.tombstones.insert(value);
        }
        delta
    }

    /// Check whether `value` is currently a member.
    pub fn contains(&self, value: &T) -> bool {
        self.present.contains(value)
    }

    /// The current membership.
    pub fn read(&self) -> &BTreeSet<T> {
        &self.present
    }

    /// The removed elements.
    pub fn tombstones(&self) -> &BTreeSet<T> {
        &self.tombstones
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

impl<T: Ord + Clone> Default for TwoPSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Lattice for TwoPSet<T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join_assign(&mut self, other: &Self) {
        for tomb in &other.tombstones {
            self.tombstones.insert(tomb.clone());
            self.present.remove(tomb);
        }
        for value in &other.present {
            if !self.tombstones.contains(value) {
                self.present.insert(value.clone());
            }
        }
    }
}
