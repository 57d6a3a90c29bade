//! Join-semilattice trait - the mathematical foundation of CRDTs
//!
//! A join-semilattice (S, ⊔) satisfies:
//! - Commutativity: a ⊔ b = b ⊔ a
//! - Associativity: (a ⊔ b) ⊔ c = a ⊔ (b ⊔ c)
//! - Idempotence:  a ⊔ a = a
//!
//! These properties guarantee convergence regardless of message order.
//! Arithmetic scalars are lattices under `max`; pairs join componentwise.
//! The lexicographic pair join lives here too, since several types (the
//! lex counter, the LWW set) merge per-entry state with it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// The core CRDT trait. All state-based CRDTs implement this.
pub trait Lattice: Clone + PartialEq {
    /// The bottom element (identity for join)
    fn bottom() -> Self;

    /// Join-assign: `self = self ⊔ other`
    /// Must be commutative, associative, and idempotent
    fn join_assign(&mut self, other: &Self);

    /// Join operation (least upper bound), deriving a new value
    fn join(&self, other: &Self) -> Self {
        let mut res = self.clone();
        res.join_assign(other);
        res
    }

    /// Partial order derived from join: a ≤ b iff a ⊔ b = b
    fn partial_cmp_lattice(&self, other: &Self) -> Option<Ordering> {
        let joined = self.join(other);
        if &joined == self && &joined == other {
            Some(Ordering::Equal)
        } else if &joined == other {
            Some(Ordering::Less)
        } else if &joined == self {
            Some(Ordering::Greater)
        } else {
            None // Concurrent/incomparable
        }
    }

    /// Check if self ≤ other in the lattice order
    fn leq(&self, other: &Self) -> bool {
        matches!(
            self.partial_cmp_lattice(other),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }
}

/// Pure merge of two lattice values.
pub fn join<T: Lattice>(l: &T, r: &T) -> T {
    l.join(r)
}

/// Arithmetic scalars join by `max`, with the type minimum as bottom.
macro_rules! max_lattice {
    ($($t:ty),* $(,)?) => {
        $(
            impl Lattice for $t {
                fn bottom() -> Self {
                    <$t>::MIN
                }

                fn join_assign(&mut self, other: &Self) {
                    if *other > *self {
                        *self = *other;
                    }
                }
            }
        )*
    };
}

max_lattice!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Lattice for bool {
    fn bottom() -> Self {
        false
    }

    fn join_assign(&mut self, other: &Self) {
        *self |= *other;
    }
}

/// Pairs join componentwise.
impl<A: Lattice, B: Lattice> Lattice for (A, B) {
    fn bottom() -> Self {
        (A::bottom(), B::bottom())
    }

    fn join_assign(&mut self, other: &Self) {
        self.0.join_assign(&other.0);
        self.1.join_assign(&other.1);
    }
}

/// Failure of a lexicographic join.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LexJoinError {
    /// The first components admit no order, so neither side may win.
    #[error("lexicographic join on incomparable first components")]
    Incomparable,
}

/// Lexicographic join of two pairs over a totally ordered first component.
///
/// The larger first component wins outright; on equal firsts the seconds
/// are joined. Infallible because `A: Ord`.
pub fn lex_join<A, B>(l: &(A, B), r: &(A, B)) -> (A, B)
where
    A: Ord + Clone,
    B: Lattice,
{
    match l.0.cmp(&r.0) {
        Ordering::Greater => l.clone(),
        Ordering::Less => r.clone(),
        Ordering::Equal => (r.0.clone(), l.1.join(&r.1)),
    }
}

/// Lexicographic join over a partially ordered first component.
///
/// Errors when the first components are incomparable: picking a side there
/// would not commute, so the caller must be told instead.
pub fn try_lex_join<A, B>(l: &(A, B), r: &(A, B)) -> Result<(A, B), LexJoinError>
where
    A: PartialOrd + Clone,
    B: Lattice,
{
    match l.0.partial_cmp(&r.0) {
        Some(Ordering::Greater) => Ok(l.clone()),
        Some(Ordering::Less) => Ok(r.clone()),
        Some(Ordering::Equal) => Ok((r.0.clone(), l.1.join(&r.1))),
        None => Err(LexJoinError::Incomparable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_join_is_max() {
        assert_eq!(join(&3u64, &7u64), 7);
        assert_eq!(join(&-4i32, &-9i32), -4);
        assert_eq!(join(&true, &false), true);
    }

    #[test]
    fn pair_join_is_componentwise() {
        let a = (1u32, 9u32);
        let b = (5u32, 2u32);
        assert_eq!(join(&a, &b), (5, 9));
    }

    #[test]
    fn lex_join_larger_first_wins() {
        // The pair with the larger timestamp carries its own second component.
        let a = (12u64, 42u64);
        let b = (20u64, 3u64);
        assert_eq!(lex_join(&a, &b), (20, 3));
        assert_eq!(lex_join(&b, &a), (20, 3));
        // Componentwise join would have mixed the halves.
        assert_eq!(join(&a, &b), (20, 42));
    }

    #[test]
    fn lex_join_equal_firsts_join_seconds() {
        let a = (7u64, 10u64);
        let b = (7u64, 25u64);
        assert_eq!(lex_join(&a, &b), (7, 25));
    }

    #[test]
    fn try_lex_join_rejects_incomparable() {
        let a = (f64::NAN, 1u64);
        let b = (0.5f64, 2u64);
        assert_eq!(try_lex_join(&a, &b), Err(LexJoinError::Incomparable));

        let c = (0.25f64, 1u64);
        assert_eq!(try_lex_join(&c, &b), Ok((0.5, 2)));
    }

    #[test]
    fn lattice_order_from_join() {
        assert!(3u64.leq(&5u64));
        assert_eq!(
            (1u32, 5u32).partial_cmp_lattice(&(5u32, 1u32)),
            None // concurrent
        );
        assert_eq!(
            (1u32, 1u32).partial_cmp_lattice(&(5u32, 1u32)),
            Some(Ordering::Less)
        );
    }
}
