//! Causal delta CRDTs: the dot kernel and the types built on it.
//!
//! Everything here rests on two pieces: the causal context (`context`),
//! which remembers every dot a replica has observed, and the dot kernel
//! (`kernel`), which keeps the active dots with their payloads. Removal
//! is the difference between the two - a dot in the context with no store
//! entry is a causally observed deletion, no tombstone required.
//!
//! On top of the kernel: observed-remove sets with either conflict bias,
//! a multi-value register, enable/disable-wins flags, a causal counter, a
//! bag of mergeable payloads with its reset-wins counter, an ordered
//! sequence over fractional positions, and an OR-map that embeds any of
//! them under one shared causal context.

pub mod aworset;
pub mod bag;
pub mod ccounter;
pub mod context;
pub mod embed;
pub mod flag;
pub mod kernel;
pub mod mvreg;
pub mod ormap;
pub mod orseq;
pub mod position;
pub mod rwcounter;
pub mod rworset;

pub use aworset::AWORSet;
pub use bag::Bag;
pub use ccounter::CCounter;
pub use context::{Dot, DotContext};
pub use embed::Embeddable;
pub use flag::{DWFlag, EWFlag};
pub use kernel::DotKernel;
pub use mvreg::MVReg;
pub use ormap::{EntryMut, ORMap};
pub use orseq::ORSeq;
pub use position::{among, Position};
pub use rwcounter::RWCounter;
pub use rworset::RWORSet;
