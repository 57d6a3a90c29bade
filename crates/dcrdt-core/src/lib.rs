//! State-based delta CRDTs: lattice primitives and plain replicated types.
//!
//! Every type here is a join-semilattice whose mutators return *deltas* -
//! small values of the same type that, joined into any replica, reproduce
//! the mutation. Types that need causal metadata (observed-remove sets,
//! multi-value registers, embeddable maps) live in `dcrdt-causal`, layered
//! on top of this crate.

pub mod bcounter;
pub mod gcounter;
pub mod gmap;
pub mod gset;
pub mod lattice;
pub mod lexcounter;
pub mod lwwreg;
pub mod lwwset;
pub mod pncounter;
pub mod twopset;

pub use bcounter::BCounter;
pub use gcounter::{CounterValue, GCounter};
pub use gmap::GMap;
pub use gset::GSet;
pub use lattice::{join, lex_join, try_lex_join, Lattice, LexJoinError};
pub use lexcounter::LexCounter;
pub use lwwreg::LWWReg;
pub use lwwset::RWLWWSet;
pub use pncounter::PNCounter;
pub use twopset::TwoPSet;
