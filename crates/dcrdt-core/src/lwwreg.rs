//! Last-Writer-Wins Register CRDT
//!
//! Keeps the value with the highest timestamp. Timestamps are caller
//! supplied and opaque; ties keep the locally held value, so callers that
//! need total determinism across replicas should use timestamps that never
//! collide (e.g. (clock, replica-id) pairs, which order lexicographically).

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};

/// A Last-Writer-Wins Register CRDT.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWReg<U: Ord + Clone + Default, V: Clone + PartialEq + Default> {
    timestamp: U,
    value: V,
}

impl<U: Ord + Clone + Default, V: Clone + PartialEq + Default> LWWReg<U, V> {
    /// Create a register holding the default value at the zero timestamp.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` at `timestamp`; only takes effect if the timestamp is
    /// newer than the current one. Returns the delta.
    pub fn write(&mut self, timestamp: U, value: V) -> Self {
        let delta = Self {
            timestamp,
            value,
        };
        self.join_assign(&delta);
        delta
    }

    /// The current value.
    pub fn read(&self) -> &V {
        &self.value
    }

    /// The timestamp of the current value.
    pub fn timestamp(&self) -> &U {
        &self.timestamp
    }
}

impl<U: Ord + Clone + Default, V: Clone + PartialEq + Default> Default for LWWReg<U, V> {
    fn default() -> Self {
        Self {
            timestamp: U::default(),
            value: V::default(),
        }
    }
}

impl<U: Ord + Clone + Default, V: Clone + PartialEq + Default> Lattice for LWWReg<U, V> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        if other.timestamp > self.timestamp {
            self.timestamp = other.timestamp.clone();
            self.value = other.value.clone();
        }
    }
}
