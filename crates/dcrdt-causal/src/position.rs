//! Fractional positions for the ordered sequence
//!
//! A position is a finite bit string under lexicographic order, with the
//! convention that `[0]` is a virtual left edge and `[1]` a virtual right
//! edge. `among` manufactures a position strictly between two others, so a
//! sequence can always host an insertion without renumbering neighbors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the sequence order: a bit string, `false < true`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(Vec<bool>);

impl Position {
    /// The virtual left edge of the order. Not a valid element position.
    pub fn left_edge() -> Self {
        Position(vec![false])
    }

    /// The virtual right edge of the order. Not a valid element position.
    pub fn right_edge() -> Self {
        Position(vec![true])
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for bit in &self.0 {
            write!(f, "{}", if *bit { '1' } else { '0' })?;
        }
        write!(f, "]")
    }
}

/// A position strictly between `left` and `right`.
///
/// First seeks the shortest prefix of `left` that, extended with a one
/// bit, falls inside the gap; failing that, extends `left` rightwards one
/// step at a time (`grain` extra zero bits per step) until the result
/// drops below `right`.
///
/// # Panics
///
/// `left < right` is a precondition; violating it is a programming error
/// and panics.
pub fn among(left: &Position, right: &Position, grain: usize) -> Position {
    assert!(
        left < right,
        "among: positions out of order ({left:?} >= {right:?})"
    );

    // Wide first: the shortest one-extended prefix inside [left, right).
    let mut bits: Vec<bool> = Vec::new();
    for take in 0..=left.0.len() {
        bits.clear();
        bits.extend_from_slice(&left.0[..take]);
        if take < left.0.len() {
            bits.push(true);
            if bits >= left.0 && bits < right.0 {
                break;
            }
        }
    }

    if bits > left.0 {
        return Position(bits);
    }

    // bits == left: advance finer and finer until below right.
    bits.extend(std::iter::repeat(false).take(grain));
    bits.push(true);
    while bits >= right.0 {
        if let Some(last) = bits.last_mut() {
            *last = false;
        }
        bits.extend(std::iter::repeat(false).take(grain));
        bits.push(true);
    }

    debug_assert!(bits > left.0 && bits < right.0);
    Position(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pos(bits: &[u8]) -> Position {
        Position(bits.iter().map(|b| *b == 1).collect())
    }

    #[test]
    fn edges_bound_everything_usable() {
        let p = among(&Position::left_edge(), &Position::right_edge(), 0);
        assert!(Position::left_edge() < p);
        assert!(p < Position::right_edge());
    }

    #[test]
    fn among_is_strictly_between() {
        let l = pos(&[0, 1, 0, 1]);
        let r = pos(&[0, 1, 1, 1]);
        let mid = among(&l, &r, 0);
        assert!(l < mid && mid < r);
    }

    #[test]
    fn among_handles_tight_gaps() {
        // Right is the immediate one-extension of left.
        let l = pos(&[0, 1]);
        let r = pos(&[0, 1, 1]);
        let mid = among(&l, &r, 0);
        assert!(l < mid && mid < r);

        let r2 = pos(&[1]);
        let mut cur = pos(&[0]);
        // Repeated insertion before the right edge keeps finding room.
        for _ in 0..64 {
            let next = among(&cur, &r2, 0);
            assert!(cur < next && next < r2);
            cur = next;
        }
    }

    #[test]
    fn grain_spreads_positions() {
        let l = pos(&[0]);
        let r = pos(&[1]);
        let fine = among(&l, &r, 0);
        let coarse = among(&l, &r, 3);
        assert!(l < coarse && coarse < r);
        assert!(coarse.len() >= fine.len());
    }

    #[test]
    #[should_panic(expected = "positions out of order")]
    fn among_rejects_inverted_bounds() {
        among(&Position::right_edge(), &Position::left_edge(), 0);
    }

    proptest! {
        #[test]
        fn among_always_lands_inside(
            lbits in prop::collection::vec(prop::bool::ANY, 1..10),
            rbits in prop::collection::vec(prop::bool::ANY, 1..10),
            grain in 0usize..4,
        ) {
            let (l, r) = (Position(lbits), Position(rbits));
            prop_assume!(l < r);
            let mid = among(&l, &r, grain);
            prop_assert!(l < mid);
            prop_assert!(mid < r);
        }
    }
}
