//! Remove-wins Last-Writer-Wins Set
//!
//! Each element carries a (timestamp, removed) pair merged with the
//! lexicographic join: the later timestamp wins, and on a timestamp tie
//! the remove wins (bool joins by max, and `true` means removed).

use crate::lattice::{lex_join, Lattice};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A remove-wins LWW set CRDT. U is the timestamp type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RWLWWSet<U: Ord + Clone, T: Ord + Clone> {
    entries: BTreeMap<T, (U, bool)>,
}

impl<U: Ord + Clone, T: Ord + Clone> RWLWWSet<U, T> {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    fn add_rmv(&mut self, timestamp: U, value: T, removed: bool) -> Self {
        let mut delta = Self::new();
        let tagged = (timestamp, removed);
        delta.entries.insert(value.clone(), tagged.clone());
        match self.entries.get_mut(&value) {
            Some(mine) => *mine = lex_join(mine, &tagged),
            None => {
                self.entries.insert(value, tagged);
            }
        }
        delta
    }

    /// Add `value` at `timestamp`. Returns the delta.
    pub fn add(&mut self, timestamp: U, value: T) -> Self {
        self.add_rmv(timestamp, value, false)
    }

    /// Remove `value` at `timestamp`. Returns the delta.
    pub fn rmv(&mut self, timestamp: U, value: T) -> Self {
        self.add_rmv(timestamp, value, true)
    }

    /// Check whether `value` is currently a member.
    pub fn contains(&self, value: &T) -> bool {
        matches!(self.entries.get(value), Some((_, false)))
    }

    /// The current membership.
    pub fn read(&self) -> BTreeSet<T> {
        self.entries
            .iter()
            .filter(|(_, (_, removed))| !removed)
            .map(|(v, _)| v.clone())
            .collect()
    }
}

impl<U: Ord + Clone, T: Ord + Clone> Default for RWLWWSet<U, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Ord + Clone, T: Ord + Clone> Lattice for RWLWWSet<U, T> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join_assign(&mut self, other: &Self) {
        for (value, tagged) in &other.entries {
            match self.entries.get_mut(value) {
                Some(mine) => *mine = lex_join(mine, tagged),
                None => {
                    self.entries.insert(value.clone(), tagged.clone());
                }
            }
        }
    }
}
