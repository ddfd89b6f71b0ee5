#![cfg(test)]

// Property tests for the tree engine: model equivalence against BTreeMap with
// red-black invariants checked after every step.

use crate::compare::{Natural, Reversed};
use crate::tree_map::{Cursor, TreeMap};
use crate::tree_set::TreeSet;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    GetOrInsert(u16, i32),
    Remove(u16),
    EraseAtCursor(u16),
    Get(u16),
    Walk(u16, u16),
    EraseWhileIterating(u8),
    Lifecycle(Lifecycle),
    CloneAndDiverge(u16),
}

#[derive(Clone, Debug)]
enum Lifecycle {
    Reserve(u8),
    Shrink,
    Clear,
    Cleanup,
}

fn arb_ops(max_key: u16) -> impl Strategy<Value = Vec<Op>> {
    let key = 0..max_key;
    let op = prop_oneof![
        6 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::GetOrInsert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::EraseAtCursor),
        2 => key.clone().prop_map(Op::Get),
        2 => (key.clone(), key.clone()).prop_map(|(a, b)| Op::Walk(a, b)),
        1 => (1u8..5).prop_map(Op::EraseWhileIterating),
        1 => prop_oneof![
            any::<u8>().prop_map(Lifecycle::Reserve),
            Just(Lifecycle::Shrink),
            Just(Lifecycle::Clear),
            Just(Lifecycle::Cleanup),
        ]
        .prop_map(Op::Lifecycle),
        1 => key.prop_map(Op::CloneAndDiverge),
    ];
    proptest::collection::vec(op, 1..200)
}

fn contents<C>(sut: &TreeMap<u16, i32, C>) -> Vec<(u16, i32)> {
    sut.iter().map(|(k, v)| (*k, *v)).collect()
}

// Property: state-machine equivalence against std::collections::BTreeMap.
// Invariants exercised across random operation sequences:
// - Red-black shape (black root, no red-red edge, equal black height) and
//   parent links after every step.
// - Forward and reverse iteration match the model's order.
// - Cursors to surviving records keep resolving to the same key across
//   inserts, erases, rotations and shrink.
// - `erase_itr` returns the erased key's successor.
// - `[first_at_or_after(lo), first_at_or_after(hi))` and the reverse walk
//   match BTreeMap ranges, including bounds past either end.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops(256)) {
        let mut sut: TreeMap<u16, i32> = TreeMap::new();
        let mut model: BTreeMap<u16, i32> = BTreeMap::new();
        let mut cursors: BTreeMap<u16, Cursor> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (c, replaced) = sut.insert(k, v).expect("insert");
                    prop_assert_eq!(replaced, model.insert(k, v).is_some());
                    if let Some(&old) = cursors.get(&k) {
                        prop_assert_eq!(old, c, "overwrite must keep the record's cursor");
                    }
                    cursors.insert(k, c);
                }
                Op::GetOrInsert(k, v) => {
                    let (c, inserted) = sut.get_or_insert(k, v).expect("get_or_insert");
                    prop_assert_eq!(inserted, !model.contains_key(&k));
                    let expected = *model.entry(k).or_insert(v);
                    prop_assert_eq!(sut.value(c), Some(&expected));
                    cursors.insert(k, c);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                    cursors.remove(&k);
                }
                Op::EraseAtCursor(k) => {
                    let c = sut.find(&k);
                    prop_assert_eq!(c.is_end(), !model.contains_key(&k));
                    if !c.is_end() {
                        let next = sut.erase_itr(c);
                        model.remove(&k);
                        cursors.remove(&k);
                        let expected = model.range(k..).next().map(|(k, _)| k);
                        prop_assert_eq!(sut.key_for(next), expected);
                    }
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                    prop_assert_eq!(sut.get_key_value(&k), model.get_key_value(&k));
                }
                Op::Walk(a, b) => {
                    let (lo, hi) = (a.min(b), a.max(b));
                    let mut fwd = Vec::new();
                    let stop = sut.first_at_or_after(&hi);
                    let mut c = sut.first_at_or_after(&lo);
                    while c != stop {
                        fwd.push(*sut.key_for(c).expect("live cursor"));
                        c = sut.next(c);
                    }
                    let expected: Vec<u16> = model.range(lo..hi).map(|(k, _)| *k).collect();
                    prop_assert_eq!(&fwd, &expected);

                    let mut back = Vec::new();
                    let stop = sut.last_at_or_before(&lo);
                    let mut c = sut.last_at_or_before(&hi);
                    while c != stop {
                        back.push(*sut.key_for(c).expect("live cursor"));
                        c = sut.prev(c);
                    }
                    let expected: Vec<u16> = model
                        .range((Bound::Excluded(lo), Bound::Included(hi)))
                        .rev()
                        .map(|(k, _)| *k)
                        .collect();
                    prop_assert_eq!(&back, &expected);

                    let ranged: Vec<u16> = sut.range(lo..=hi).map(|(k, _)| *k).collect();
                    let expected: Vec<u16> = model.range(lo..=hi).map(|(k, _)| *k).collect();
                    prop_assert_eq!(ranged, expected);
                }
                Op::EraseWhileIterating(m) => {
                    let m = i32::from(m);
                    let mut visited = Vec::new();
                    let mut c = sut.first();
                    while !c.is_end() {
                        visited.push(*sut.key_for(c).expect("live cursor"));
                        c = if sut.value(c).is_some_and(|v| v.rem_euclid(m) == 0) {
                            sut.erase_itr(c)
                        } else {
                            sut.next(c)
                        };
                    }
                    let expected: Vec<u16> = model.keys().copied().collect();
                    prop_assert_eq!(visited, expected);
                    model.retain(|_, v| v.rem_euclid(m) != 0);
                    cursors.retain(|k, _| model.contains_key(k));
                }
                Op::Lifecycle(Lifecycle::Reserve(n)) => {
                    let n = usize::from(n);
                    sut.reserve(n).expect("reserve");
                    prop_assert!(sut.capacity() >= n);
                }
                Op::Lifecycle(Lifecycle::Shrink) => {
                    sut.shrink().expect("shrink");
                    prop_assert_eq!(sut.is_allocated(), !model.is_empty());
                }
                Op::Lifecycle(Lifecycle::Clear) => {
                    sut.clear();
                    model.clear();
                    cursors.clear();
                }
                Op::Lifecycle(Lifecycle::Cleanup) => {
                    sut.cleanup();
                    model.clear();
                    cursors.clear();
                    prop_assert!(!sut.is_allocated());
                }
                Op::CloneAndDiverge(k) => {
                    let mut copy = sut.try_clone().expect("clone");
                    copy.check_invariants();
                    prop_assert_eq!(contents(&copy), contents(&sut));
                    copy.insert(k, -1).expect("insert into clone");
                    copy.erase(&k);
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                }
            }

            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            for (k, &c) in &cursors {
                prop_assert_eq!(sut.key_for(c), Some(k), "cursor for {} moved", k);
            }
            let fwd: Vec<(u16, i32)> = contents(&sut);
            let expected: Vec<(u16, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(&fwd, &expected);
            let rev: Vec<u16> = sut.iter().rev().map(|(k, _)| *k).collect();
            let expected_rev: Vec<u16> = model.keys().rev().copied().collect();
            prop_assert_eq!(rev, expected_rev);
        }
    }
}

// Property: a small key space forces heavy overwrite/erase churn, including
// repeated emptying, without ever unbalancing the tree.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_dense(ops in proptest::collection::vec((any::<bool>(), 0u8..12), 1..300)) {
        let mut sut: TreeSet<u8> = TreeSet::new();
        let mut model = BTreeSet::new();
        for (insert, k) in ops {
            if insert {
                let (_, inserted) = sut.get_or_insert(k).expect("insert");
                prop_assert_eq!(inserted, model.insert(k));
            } else {
                prop_assert_eq!(sut.take(&k), model.take(&k));
            }
            prop_assert!(sut.iter().copied().eq(model.iter().copied()));
        }
    }

    #[test]
    fn prop_reversed_order_matches(keys in proptest::collection::vec(any::<i16>(), 0..200)) {
        let mut sut = TreeMap::with_comparator(Reversed(Natural));
        for &k in &keys {
            sut.insert(k, ()).expect("insert");
        }
        sut.check_invariants();
        let mut expected: Vec<i16> = keys.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.dedup();
        let got: Vec<i16> = sut.keys().copied().collect();
        prop_assert_eq!(got, expected);
    }
}
