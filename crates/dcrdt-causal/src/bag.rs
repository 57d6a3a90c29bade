//! Bag - a kernel of CRDT payloads with one mutable slot per replica
//!
//! Where the plain kernel treats payloads as opaque (equal under a shared
//! dot by construction), the bag's payloads are themselves joinable, and
//! its merge is the deep join: concurrent updates under the same dot meet
//! in the payload lattice. Each replica works in the slot under its most
//! recent own dot; `fresh` opens a new slot that no concurrent reset has
//! observed.

use crate::context::{Dot, DotContext};
use crate::embed::Embeddable;
use crate::kernel::DotKernel;
use dcrdt_core::lattice::Lattice;
use serde::{Deserialize, Serialize};

/// A bag of joinable payloads keyed by dot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "V: Lattice + Serialize, K: Serialize + Ord + Clone",
    deserialize = "V: Lattice + Deserialize<'de>, K: Deserialize<'de> + Ord + Clone"
))]
pub struct Bag<V: Lattice + Default, K: Ord + Clone> {
    #[serde(skip)]
    id: Option<K>,
    kernel: DotKernel<V, K>,
}

impl<V: Lattice + Default, K: Ord + Clone> Bag<V, K> {
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

    /// Active dots and payloads.
    pub fn iter(&self) -> impl Iterator<Item = (&Dot<K>, &V)> {
        self.kernel.iter()
    }

    pub fn len(&self) -> usize {
        self.kernel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernel.is_empty()
    }

    fn latest_own_dot(&self) -> Option<Dot<K>> {
        let id = self.own_id();
        self.kernel
            .iter()
            .filter(|(dot, _)| dot.actor == id)
            .map(|(dot, _)| dot.clone())
            .max()
    }

    /// Open a fresh slot under a new own dot. A slot opened after a remote
    /// reset was prepared is not observed by it, so the slot's content
    /// survives the reset.
    pub fn fresh(&mut self) {
        let id = self.own_id();
        self.kernel.dot_add(&id, V::default());
    }

    /// This replica's current dot, allocating a slot if none is active.
    pub fn my_dot(&mut self) -> Dot<K> {
        match self.latest_own_dot() {
            Some(dot) => dot,
            None => {
                let id = self.own_id();
                self.kernel.dot_add(&id, V::default())
            }
        }
    }

    /// Mutable access to the payload under this replica's current dot,
    /// allocating a slot if none is active.
    pub fn my_data(&mut self) -> &mut V {
        let dot = self.my_dot();
        self.kernel
            .store
            .get_mut(&dot)
            .expect("own dot just resolved or allocated")
    }

    /// Place `payload` under `dot` directly; used to assemble deltas that
    /// mirror a mutation already applied to a replica's own slot.
    pub fn insert(&mut self, dot: Dot<K>, payload: V) {
        self.kernel.store.insert(dot.clone(), payload);
        self.kernel.ctx.insert_dot(dot, true);
    }

    /// Remove every observed dot. Returns the delta.
    pub fn reset(&mut self) -> Self {
        let mut delta = Self::default();
        delta.kernel = self.kernel.remove_all();
        delta
    }
}

impl<V: Lattice + Default, K: Ord + Clone> Default for Bag<V, K> {
    fn default() -> Self {
        Self {
            id: None,
            kernel: DotKernel::new(),
        }
    }
}

impl<V: Lattice + Default, K: Ord + Clone> PartialEq for Bag<V, K> {
    fn eq(&self, other: &Self) -> bool {
        self.kernel == other.kernel
    }
}

impl<V: Lattice + Default, K: Ord + Clone> Eq for Bag<V, K> {}

impl<V: Lattice + Default, K: Ord + Clone> Lattice for Bag<V, K> {
    fn bottom() -> Self {
        Self::default()
    }

    fn join_assign(&mut self, other: &Self) {
        self.kernel.deep_join_assign(&other.kernel);
    }
}

impl<V: Lattice + Default, K: Ord + Clone> Embeddable<K> for Bag<V, K> {
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
        Bag::reset(self)
    }
}
