#![cfg(test)]

// Property tests for the hash engine kept inside the crate so they can check
// the table's structural invariants after every step.

use crate::hash_map::{Cursor, HashMap};
use crate::hash_set::HashSet;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap as StdHashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    GetOrInsert(usize, i32),
    Remove(usize),
    EraseAtCursor(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    EraseWhileIterating(u8),
    Reserve(u8),
    Shrink,
    Clear,
    Cleanup,
    CloneAndDiverge(usize),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::GetOrInsert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::EraseAtCursor),
            2 => idx.clone().prop_map(Op::Get),
            1 => "[a-z]{0,4}".prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (1u8..5).prop_map(Op::EraseWhileIterating),
            1 => idx.clone().prop_map(Op::CloneAndDiverge),
            3 => prop_oneof![
                any::<u8>().prop_map(Op::Reserve),
                Just(Op::Shrink),
                Just(Op::Clear),
                Just(Op::Cleanup),
                Just(Op::Iterate),
            ],
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn key_set<S>(sut: &HashMap<Key, i32, S>) -> BTreeMap<Key, i32> {
    sut.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

fn run_scenario<S>(
    mut sut: HashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: StdHashMap<Key, i32> = StdHashMap::new();
    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let (c, replaced) = sut.insert(k.clone(), v).expect("insert");
                prop_assert_eq!(replaced, model.insert(k.clone(), v).is_some());
                prop_assert_eq!(sut.key_for(c), Some(&k));
                prop_assert_eq!(sut.value(c), Some(&v));
            }
            Op::GetOrInsert(i, v) => {
                let k = key_from(pool, i);
                let (c, inserted) = sut.get_or_insert(k.clone(), v).expect("get_or_insert");
                prop_assert_eq!(inserted, !model.contains_key(&k));
                let expected = *model.entry(k).or_insert(v);
                prop_assert_eq!(sut.value(c), Some(&expected));
            }
            Op::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::EraseAtCursor(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(c.is_end(), !model.contains_key(&k));
                if !c.is_end() {
                    let next = sut.erase_itr(c);
                    model.remove(&k);
                    // The continuation is a live record or the end.
                    prop_assert!(next.is_end() || sut.key_for(next).is_some());
                }
            }
            Op::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.get(k.0.as_str()), model.get(&k));
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            Op::EraseWhileIterating(m) => {
                let m = i32::from(m);
                let mut visited = BTreeSet::new();
                let mut c = sut.first();
                while !c.is_end() {
                    let k = sut.key_for(c).expect("live cursor").clone();
                    prop_assert!(visited.insert(k.clone()), "{:?} visited twice", k);
                    c = if sut.value(c).is_some_and(|v| v.rem_euclid(m) == 0) {
                        sut.erase_itr(c)
                    } else {
                        sut.next(c)
                    };
                }
                prop_assert_eq!(visited.len(), model.len());
                model.retain(|_, v| v.rem_euclid(m) != 0);
            }
            Op::Reserve(n) => {
                let n = usize::from(n);
                sut.reserve(n).expect("reserve");
                prop_assert!(sut.capacity() >= n);
            }
            Op::Shrink => {
                sut.shrink().expect("shrink");
                prop_assert_eq!(sut.is_allocated(), !model.is_empty());
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::Cleanup => {
                sut.cleanup();
                model.clear();
                prop_assert!(!sut.is_allocated());
            }
            Op::CloneAndDiverge(i) => {
                let mut copy = sut.try_clone().expect("clone");
                copy.check_invariants();
                prop_assert_eq!(key_set(&copy), key_set(&sut));
                let k = key_from(pool, i);
                copy.insert(k.clone(), 0).expect("insert into clone");
                copy.erase(&k);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    let expected: BTreeMap<Key, i32> = model.into_iter().collect();
    prop_assert_eq!(key_set(&sut), expected);
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `get` returns the value of the most recent insert not followed by an erase.
// - Borrowed (`&str`) lookups agree with owned-key lookups.
// - Erasing through `erase_itr` while walking visits each record exactly once.
// - Metadata, home reachability and tail trimming hold after every step.
// - Clones are independent and start structurally valid.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(HashMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Few distinct hashes: long runs that spill into the overflow tail and shift
// back on erase.
#[derive(Clone, Default)]
struct CoarseBuildHasher;
struct CoarseHasher(u64);
impl BuildHasher for CoarseBuildHasher {
    type Hasher = CoarseHasher;
    fn build_hasher(&self) -> Self::Hasher {
        CoarseHasher(0)
    }
}
impl Hasher for CoarseHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(*b));
        }
    }
    fn finish(&self) -> u64 {
        // Keep only a handful of home buckets, but vary the tag bits.
        (self.0 % 3) | (self.0 << 57)
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(HashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_clustering((pool, ops) in arb_scenario()) {
        run_scenario(HashMap::with_hasher(CoarseBuildHasher), &pool, ops)?;
    }
}

// Property: a set driven by integer inserts and erases matches a BTreeSet, and
// `retain` keeps exactly the accepted keys.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_matches_model(
        ops in proptest::collection::vec((any::<bool>(), 0u16..512), 1..400),
        keep_mod in 1u16..6,
    ) {
        let mut sut: HashSet<u16> = HashSet::new();
        let mut model = BTreeSet::new();
        for (insert, k) in ops {
            if insert {
                let (_, replaced) = sut.insert(k).expect("insert");
                prop_assert_eq!(replaced, !model.insert(k));
            } else {
                prop_assert_eq!(sut.erase(&k), model.remove(&k));
            }
        }
        sut.retain(|k| k % keep_mod == 0);
        model.retain(|k| k % keep_mod == 0);
        let got: BTreeSet<u16> = sut.iter().copied().collect();
        prop_assert_eq!(got, model);
    }
}

#[test]
fn cursor_end_is_shared() {
    let m: HashMap<Key, i32> = HashMap::new();
    assert_eq!(m.end(), Cursor::END);
    assert_eq!(m.first(), Cursor::END);
}
