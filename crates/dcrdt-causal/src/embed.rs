//! The contract for CRDTs that can live inside an OR-map
//!
//! An embedded value never owns its causal history: the map holds the one
//! context shared by every entry, and lends it to a value for the duration
//! of an operation (see `ormap::EntryMut`). At rest an embedded value's own
//! context is empty. What the map needs from its values is exactly this
//! trait: construction under a replica id, access to the context slot so it
//! can be lent and reclaimed, reset for tombstone-free erasure, and the
//! lattice join.

use crate::context::DotContext;
use dcrdt_core::lattice::Lattice;

/// A causal CRDT that an [`ORMap`](crate::ormap::ORMap) can hold as a value.
pub trait Embeddable<K: Ord + Clone>: Lattice + Default {
    /// A fresh, empty value owned by `id`.
    fn with_id(id: K) -> Self;

    /// The causal context slot.
    fn context(&self) -> &DotContext<K>;

    /// Mutable access to the context slot, used by the enclosing map to
    /// lend its own context in and out.
    fn context_mut(&mut self) -> &mut DotContext<K>;

    /// Remove all content. The returned delta observes the removed dots in
    /// its context and stores nothing, which is what makes map erasure
    /// tombstone-free.
    fn reset(&mut self) -> Self;
}
