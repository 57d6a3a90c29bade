//! End-to-end convergence scenarios for the causal types
//!
//! These exercise the documented concurrent-edit outcomes with literal
//! inputs: conflict bias of the two set flavors, tombstone-free map
//! erasure, quota enforcement, and reset-versus-increment races. The
//! shuffle tests check the one property everything else rests on: any
//! delta set, in any order, with any duplication, converges.

use dcrdt_causal::{AWORSet, CCounter, DotContext, MVReg, ORMap, ORSeq, RWCounter, RWORSet};
use dcrdt_core::lattice::{join, Lattice};
use dcrdt_core::{BCounter, GSet};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// E1: concurrent add and remove of "apple"; the add wins.
#[test]
fn aworset_add_wins() {
    let mut sx: AWORSet<&str, &str> = AWORSet::new("x");
    let mut sy: AWORSet<&str, &str> = AWORSet::new("y");

    sx.add("apple");
    sx.rmv(&"apple");
    sy.add("juice");
    sy.add("apple");

    sx.join_assign(&sy);
    assert_eq!(sx.read(), BTreeSet::from(["apple", "juice"]));
}

/// E2: the same run on the remove-wins set; the remove wins.
#[test]
fn rworset_remove_wins() {
    let mut sx: RWORSet<&str, char> = RWORSet::new('x');
    let mut sy: RWORSet<&str, char> = RWORSet::new('y');

    sx.add("apple");
    sx.rmv(&"apple");
    sy.add("juice");
    sy.add("apple");

    sx.join_assign(&sy);
    assert_eq!(sx.read(), BTreeSet::from(["juice"]));
}

/// E3: a replica forked from full state ships only its deltas back.
#[test]
fn gset_delta_shipping() {
    let mut sx: GSet<i32> = GSet::new();
    sx.add(1);
    sx.add(4);

    let mut sy = sx.clone();
    let mut dy = sy.add(2);
    dy.join_assign(&sy.add(3));

    assert_eq!(dy.read(), &BTreeSet::from([2, 3]));
    assert_eq!(sy.read(), &BTreeSet::from([1, 2, 3, 4]));

    sx.join_assign(&dy);
    assert_eq!(sx.read(), &BTreeSet::from([1, 2, 3, 4]));
}

/// E4: erase of a key concurrent with an embedded add under that key.
#[test]
fn ormap_tombstone_free_remove() {
    type Map = ORMap<&'static str, AWORSet<&'static str, &'static str>, &'static str>;

    let mut mx: Map = ORMap::new("x");
    mx.entry("color").add("red");
    mx.entry("color").add("blue");

    let mut my: Map = ORMap::new("y");
    my.join_assign(&mx);
    my.erase(&"color");

    mx.entry("color").add("black");
    mx.join_assign(&my);

    assert_eq!(
        mx.get(&"color").map(|v| v.read()).unwrap_or_default(),
        BTreeSet::from(["black"])
    );
}

/// E5: decentralized quota: over-budget decrements are refused locally.
#[test]
fn bcounter_quota() {
    let mut a: BCounter<i64, char> = BCounter::new('a');
    a.inc(10);

    let noop = a.dec(15);
    assert_eq!(noop, BCounter::default());
    assert_eq!(a.read(), 10);

    a.dec(5);
    a.mv(3, 'b');

    let mut b: BCounter<i64, char> = BCounter::new('b');
    b.join_assign(&a);

    assert_eq!(a.local(), 2);
    assert_eq!(b.local(), 3);
    assert_eq!(b.read(), 5);
}

/// E6: a fresh slot opened concurrently with a reset survives it.
#[test]
fn rwcounter_fresh_survives_reset() {
    let mut i: RWCounter<u64, char> = RWCounter::new('i');
    let mut j: RWCounter<u64, char> = RWCounter::new('j');

    i.inc(1);
    j.join_assign(&i);
    let reset = j.reset();

    i.fresh();
    i.inc(1);
    i.join_assign(&reset);
    assert_eq!(i.read(), 1);
}

/// The causal-counter variant of E6 without fresh: reset zeroes what it
/// observed, later contributions survive.
#[test]
fn ccounter_reset_observed_only() {
    let mut a: CCounter<i64, char> = CCounter::new('a');
    let mut b: CCounter<i64, char> = CCounter::new('b');

    a.inc(1);
    b.join_assign(&a);
    let reset = b.reset();

    a.join_assign(&reset);
    assert_eq!(a.read(), 0);

    a.inc(5);
    a.join_assign(&reset); // duplicate delivery
    assert_eq!(a.read(), 5);
}

#[test]
fn mvreg_concurrent_writes_then_overwrite() {
    let mut a: MVReg<&str, &str> = MVReg::new("a");
    let mut b: MVReg<&str, &str> = MVReg::new("b");
    let mut c: MVReg<&str, &str> = MVReg::new("c");

    a.write("v1");
    b.write("v2");
    c.write("v3");

    a.join_assign(&b);
    a.join_assign(&c);
    assert_eq!(a.read(), BTreeSet::from(["v1", "v2", "v3"]));

    let delta = a.write("v4");
    assert_eq!(a.read(), BTreeSet::from(["v4"]));

    b.write("v5"); // concurrent with v4, unobserved by it
    b.join_assign(&delta);
    assert_eq!(b.read(), BTreeSet::from(["v4", "v5"]));

    b.write("v6"); // observed both survivors
    assert_eq!(b.read(), BTreeSet::from(["v6"]));
}

#[test]
fn orseq_total_order_across_replicas() {
    let mut a: ORSeq<char, &str> = ORSeq::new("a");
    let mut b: ORSeq<char, &str> = ORSeq::new("b");

    a.push_back('h');
    a.push_back('i');
    b.join_assign(&a);

    // Concurrent inserts at the same index on both sides.
    a.insert(1, 'x');
    b.insert(1, 'y');

    let ab = join(&a, &b);
    let ba = join(&b, &a);
    assert_eq!(ab, ba);
    assert_eq!(ab.len(), 4);

    let rendered: String = ab.iter().collect();
    assert_eq!(rendered.chars().next(), Some('h'));
    assert_eq!(rendered.chars().last(), Some('i'));
}

#[test]
fn ormap_embeds_sequences() {
    type SeqMap = ORMap<&'static str, ORSeq<char, &'static str>, &'static str>;

    let mut ms1: SeqMap = ORMap::new("id1");
    let mut ms2: SeqMap = ORMap::new("id2");

    ms1.entry("upper").push_back('a');
    ms2.entry("upper").push_front('b');
    ms2.entry("lower").push_front('c');

    ms1.join_assign(&ms2);
    assert_eq!(ms1.get(&"upper").map(|s| s.len()), Some(2));
    assert_eq!(ms1.get(&"lower").map(|s| s.read()), Some(vec!['c']));

    // ms2 erases "upper" without having observed ms1's insert, so only
    // its own entry dies in the merge.
    ms2.erase(&"upper");
    ms1.join_assign(&ms2);
    assert_eq!(ms1.get(&"upper").map(|s| s.read()), Some(vec!['a']));
}

/// Law 6: every kernel-backed replica keeps its context well formed.
#[test]
fn causal_well_formedness() {
    fn check(ctx: &DotContext<&'static str>) {
        for dot in ctx.cloud() {
            let prefix = ctx.prefix_of(&dot.actor);
            assert!(dot.counter > prefix + 1, "cloud dot dominated or contiguous");
        }
    }

    let mut a: AWORSet<i32, &str> = AWORSet::new("a");
    let mut b: AWORSet<i32, &str> = AWORSet::new("b");
    let mut deltas = Vec::new();
    for i in 0..10 {
        deltas.push(a.add(i));
        deltas.push(b.add(i * 2));
        if i % 3 == 0 {
            deltas.push(a.rmv(&i));
        }
    }
    a.join_assign(&b);
    check(a.context());

    // A replica fed deltas out of order still compacts to a clean context.
    let mut c: AWORSet<i32, &str> = AWORSet::default();
    for delta in deltas.iter().rev() {
        c.join_assign(delta);
    }
    check(c.context());

    c.join_assign(&a);
    check(c.context());
    assert_eq!(c.read(), a.read());
}

proptest! {
    /// Determinism: one replica's deltas, delivered in any order with any
    /// duplication, rebuild the same state.
    #[test]
    fn aworset_deltas_converge_any_order(
        ops in prop::collection::vec((0i32..8, prop::bool::ANY), 1..24),
        extra in prop::collection::vec(0usize..24, 0..24),
    ) {
        let mut replica: AWORSet<i32, &str> = AWORSet::new("r");
        let mut deltas = Vec::new();
        for (value, remove) in ops {
            if remove {
                deltas.push(replica.rmv(&value));
            } else {
                deltas.push(replica.add(value));
            }
        }

        let shuffled = {
            let mut v: Vec<usize> = (0..deltas.len()).collect();
            v.reverse();
            v
        };

        let mut rebuilt: AWORSet<i32, &str> = AWORSet::default();
        for idx in &extra {
            rebuilt.join_assign(&deltas[idx % deltas.len()]);
        }
        for idx in shuffled {
            rebuilt.join_assign(&deltas[idx]);
        }
        prop_assert_eq!(rebuilt, replica);
    }

    /// Two-replica histories: shipping the joined delta groups equals
    /// shipping full states.
    #[test]
    fn delta_groups_equal_full_state(
        ops_x in prop::collection::vec((0i32..6, prop::bool::ANY), 1..12),
        ops_y in prop::collection::vec((0i32..6, prop::bool::ANY), 1..12),
    ) {
        let mut x: AWORSet<i32, &str> = AWORSet::new("x");
        let mut y: AWORSet<i32, &str> = AWORSet::new("y");
        let mut dx: AWORSet<i32, &str> = AWORSet::default();
        let mut dy: AWORSet<i32, &str> = AWORSet::default();

        for (value, remove) in ops_x {
            let delta = if remove { x.rmv(&value) } else { x.add(value) };
            dx.join_assign(&delta);
        }
        for (value, remove) in ops_y {
            let delta = if remove { y.rmv(&value) } else { y.add(value) };
            dy.join_assign(&delta);
        }

        let via_full = join(&x, &y);
        let via_deltas = join(&join(&x, &dy), &join(&y, &dx));
        prop_assert_eq!(via_full, via_deltas);
    }

    #[test]
    fn orseq_two_replica_convergence(
        ops in prop::collection::vec((0usize..4, any::<u8>()), 1..16),
    ) {
        let mut a: ORSeq<u8, &str> = ORSeq::new("a");
        let mut b: ORSeq<u8, &str> = ORSeq::new("b");

        for (i, (kind, value)) in ops.into_iter().enumerate() {
            let target = if i % 2 == 0 { &mut a } else { &mut b };
            match kind {
                0 => {
                    target.push_back(value);
                }
                1 => {
                    target.push_front(value);
                }
                2 if !target.is_empty() => {
                    target.remove(0);
                }
                _ => {
                    let at = target.len() / 2;
                    target.insert(at, value);
                }
            }
        }

        let ab = join(&a, &b);
        let ba = join(&b, &a);
        prop_assert_eq!(&ab, &ba);

        // Idempotent under repeated merging.
        let again = join(&ab, &a);
        prop_assert_eq!(&ab, &again);
    }
}
