// TreeMap integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Order: iteration is ascending under the comparator, forward and back.
// - Range queries: `first_at_or_after`/`last_at_or_before` bound half-open
//   walks in either direction; bounds past either end degrade to a full
//   scan or an empty one.
// - Stability: a cursor keeps naming its record until that record is
//   erased, whatever else is inserted or erased.
// - Boundaries: `end()` and `r_end()` are constants across all states.
// - Ownership: clones share nothing; records are dropped exactly once.
mod common;

use assoc_containers::tree_map::Cursor;
use assoc_containers::{Natural, Reversed, TreeMap};
use common::{init_test_logger, DropCounter};
use std::cell::Cell;
use std::rc::Rc;

fn permuted(n: i32) -> TreeMap<i32, String> {
    // 37 is coprime with every n used here, so each key appears once.
    let mut m = TreeMap::new();
    for i in 0..n {
        let k = (i * 37) % n;
        m.insert(k, k.to_string()).unwrap();
    }
    m
}

fn walk_forward(m: &TreeMap<i32, String>, from: Cursor, to: Cursor) -> Vec<i32> {
    let mut out = Vec::new();
    let mut c = from;
    while c != to {
        out.push(*m.key_for(c).unwrap());
        c = m.next(c);
    }
    out
}

fn walk_backward(m: &TreeMap<i32, String>, from: Cursor, to: Cursor) -> Vec<i32> {
    let mut out = Vec::new();
    let mut c = from;
    while c != to {
        out.push(*m.key_for(c).unwrap());
        c = m.prev(c);
    }
    out
}

// Test: half-open range walks.
// Assumes: keys 0..100 inserted in a scrambled order.
// Verifies: [first(25), first(75)) forward yields 25..=74 and
// [last(75), last(25)) backward yields 75 down to 26.
#[test]
fn range_walks_in_both_directions() {
    init_test_logger();
    let m = permuted(100);
    assert_eq!(m.len(), 100);
    assert_eq!(m.iter().rev().count(), 100);

    let fwd = walk_forward(&m, m.first_at_or_after(&25), m.first_at_or_after(&75));
    assert_eq!(fwd, (25..75).collect::<Vec<_>>());

    let back = walk_backward(&m, m.last_at_or_before(&75), m.last_at_or_before(&25));
    assert_eq!(back, (26..=75).rev().collect::<Vec<_>>());
}

// Test: out-of-range bounds.
// Verifies: a lower bound below every key starts at `first()`, an upper
// bound above every key is `end()`, and walks built from them cover all or
// nothing.
#[test]
fn range_bounds_past_either_end() {
    let m = permuted(100);
    assert_eq!(m.first_at_or_after(&-10), m.first());
    assert_eq!(m.first_at_or_after(&1000), m.end());
    assert_eq!(m.last_at_or_before(&1000), m.last());
    assert_eq!(m.last_at_or_before(&-1), m.r_end());

    let all = walk_forward(&m, m.first_at_or_after(&-10), m.first_at_or_after(&1000));
    assert_eq!(all, (0..100).collect::<Vec<_>>());
    let none = walk_forward(&m, m.first_at_or_after(&500), m.first_at_or_after(&1000));
    assert!(none.is_empty());
    let all_back = walk_backward(&m, m.last_at_or_before(&1000), m.last_at_or_before(&-1));
    assert_eq!(all_back, (0..100).rev().collect::<Vec<_>>());

    // Gaps: bounds that fall between keys snap to the nearest key inward.
    let mut sparse = TreeMap::new();
    for k in (0..100).step_by(10) {
        sparse.insert(k, ()).unwrap();
    }
    assert_eq!(sparse.key_for(sparse.first_at_or_after(&15)), Some(&20));
    assert_eq!(sparse.key_for(sparse.last_at_or_before(&15)), Some(&10));
    let inner: Vec<i32> = sparse.range(15..=45).map(|(k, _)| *k).collect();
    assert_eq!(inner, vec![20, 30, 40]);
    assert_eq!(sparse.range(41..49).count(), 0);
    assert_eq!(sparse.range(60..30).count(), 0);
}

// Test: cursor stability under churn.
// Verifies: cursors to odd keys keep resolving after every even key is
// erased and a new batch is inserted around them.
#[test]
fn cursors_survive_unrelated_erases() {
    let mut m = TreeMap::new();
    let mut cursors = Vec::new();
    for k in 0..200u32 {
        let (c, _) = m.insert(k, k * 10).unwrap();
        cursors.push((k, c));
    }
    for k in (0..200u32).step_by(2) {
        assert!(m.erase(&k));
    }
    for k in 1000..1100u32 {
        m.insert(k, 0).unwrap();
    }
    m.shrink().unwrap();
    for &(k, c) in cursors.iter().filter(|(k, _)| k % 2 == 1) {
        assert_eq!(m.key_for(c), Some(&k));
        assert_eq!(m.value(c), Some(&(k * 10)));
    }
    // erase_itr hands back the successor even after the churn.
    let c = m.find(&199);
    let next = m.erase_itr(c);
    assert_eq!(m.key_for(next), Some(&1000));
    let c = m.find(&1099);
    assert_eq!(m.erase_itr(c), m.end());
}

// Test: cursor to an erased record.
// Assumes: the next insert reuses the erased record's storage.
// Verifies: the old cursor names nothing; it does not read or walk from
// the record inserted after it.
#[test]
fn erased_cursor_names_nothing() {
    let mut m = TreeMap::new();
    let (stale, _) = m.insert(1u32, "one").unwrap();
    m.insert(2, "two").unwrap();
    assert!(m.erase(&1));
    let (nine, _) = m.insert(9, "nine").unwrap();
    assert_ne!(stale, nine);
    assert_eq!(m.key_for(stale), None);
    assert_eq!(m.value(stale), None);
    assert_eq!(m.value_mut(stale), None);
    assert_eq!(m.next(stale), m.end());
    assert_eq!(m.prev(stale), m.r_end());
    assert_eq!(m.get(&9), Some(&"nine"));
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![2, 9]);
}

// Test: erase while iterating.
// Verifies: erasing through `erase_itr` during a forward walk visits every
// key once and leaves exactly the survivors, in order.
#[test]
fn erase_while_iterating_keeps_order() {
    let mut m = permuted(100);
    let mut visited = Vec::new();
    let mut c = m.first();
    while c != m.end() {
        let k = *m.key_for(c).unwrap();
        visited.push(k);
        c = if k % 3 == 0 { m.erase_itr(c) } else { m.next(c) };
    }
    assert_eq!(visited, (0..100).collect::<Vec<_>>());
    let left: Vec<i32> = m.keys().copied().collect();
    assert_eq!(left, (0..100).filter(|k| k % 3 != 0).collect::<Vec<_>>());
}

// Test: boundary stability.
// Verifies: `end()` and `r_end()` never change across placeholder, live and
// emptied states, and match the shared constants.
#[test]
fn boundaries_are_stable_across_states() {
    let mut m: TreeMap<u8, u8> = TreeMap::new();
    let (end, r_end) = (m.end(), m.r_end());
    assert_eq!(m.first(), end);
    assert_eq!(m.last(), r_end);
    for k in 0..=255 {
        m.insert(k, k).unwrap();
    }
    assert_eq!((m.end(), m.r_end()), (end, r_end));
    assert_eq!(m.next(m.last()), end);
    assert_eq!(m.prev(m.first()), r_end);
    m.cleanup();
    assert_eq!((m.end(), m.r_end()), (end, r_end));
    assert_eq!((end, r_end), (Cursor::END, Cursor::R_END));
}

// Test: placeholder round trip.
// Verifies: construction, reserve(0) and shrink-on-empty own nothing;
// clear keeps the pool; cleanup and shrink after clear release it.
#[test]
fn placeholder_round_trip() {
    let mut m: TreeMap<String, u32> = TreeMap::new();
    assert!(!m.is_allocated());
    assert_eq!((m.len(), m.capacity()), (0, 0));
    m.reserve(0).unwrap();
    m.shrink().unwrap();
    assert!(!m.is_allocated());

    m.reserve(64).unwrap();
    assert!(m.capacity() >= 64);
    for i in 0..64 {
        m.insert(format!("k{i:02}"), i).unwrap();
    }
    m.clear();
    assert!(m.is_allocated());
    assert!(m.is_empty());
    m.shrink().unwrap();
    assert!(!m.is_allocated());
    assert_eq!(m.capacity(), 0);

    m.insert("again".into(), 1).unwrap();
    m.cleanup();
    assert!(!m.is_allocated());
    assert_eq!(m.iter().count(), 0);
    assert_eq!(m.range::<str, _>(..).count(), 0);
}

// Test: clone independence.
// Verifies: a clone preserves order and content; edits on either side do
// not leak to the other.
#[test]
fn clone_is_independent() {
    let mut a = permuted(50);
    let mut b = a.clone();
    assert!(a.iter().eq(b.iter()));
    b.erase(&10);
    b.get_mut(&11).unwrap().push('!');
    a.insert(77, "x".into()).unwrap();
    assert_eq!(a.get(&10).map(String::as_str), Some("10"));
    assert_eq!(a.get(&11).map(String::as_str), Some("11"));
    assert_eq!(b.get(&11).map(String::as_str), Some("11!"));
    assert!(!b.contains_key(&77));

    let empty: TreeMap<i32, String> = TreeMap::new();
    assert!(!empty.try_clone().unwrap().is_allocated());
}

// Test: destruction accounting.
// Verifies: overwrite, get_or_insert on a present key, erase, retain and
// clear each drop exactly the values they discard; the map drops the rest.
#[test]
fn records_drop_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    let mut m = TreeMap::new();
    for i in 0..10u32 {
        m.insert(i, DropCounter::new(i, &drops)).unwrap();
    }
    m.insert(2, DropCounter::new(22, &drops)).unwrap();
    assert_eq!(drops.get(), 1);
    assert_eq!(m.get(&2).map(|d| d.id), Some(22));

    let (c, inserted) = m.get_or_insert(3, DropCounter::new(33, &drops)).unwrap();
    assert!(!inserted);
    assert_eq!(drops.get(), 2);
    assert_eq!(m.value(c).map(|d| d.id), Some(3));

    assert!(m.remove(&4).is_some());
    assert_eq!(drops.get(), 3);
    m.retain(|k, _| *k < 8);
    assert_eq!(drops.get(), 5);
    m.clear();
    assert_eq!(drops.get(), 12);

    m.insert(0, DropCounter::new(0, &drops)).unwrap();
    drop(m);
    assert_eq!(drops.get(), 13);
}

// Test: custom orders.
// Verifies: a reversed comparator iterates descending and flips the roles
// of the range bounds; a closure comparator works on borrowed keys.
#[test]
fn custom_comparators() {
    let mut desc = TreeMap::with_comparator(Reversed(Natural));
    desc.extend((0..10).map(|k| (k, ())));
    assert_eq!(desc.keys().copied().collect::<Vec<i32>>(), (0..10).rev().collect::<Vec<_>>());
    // Under the reversed order, "at or after 5" means 5 or smaller.
    assert_eq!(desc.key_for(desc.first_at_or_after(&5)), Some(&5));
    assert_eq!(desc.key_for(desc.next(desc.first_at_or_after(&5))), Some(&4));

    let by_len = |a: &String, b: &String| a.len().cmp(&b.len()).then_with(|| a.cmp(b));
    let mut words = TreeMap::with_comparator(by_len);
    for w in ["pear", "fig", "banana", "kiwi"] {
        words.insert(w.to_string(), w.len()).unwrap();
    }
    let order: Vec<&str> = words.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["fig", "kiwi", "pear", "banana"]);
}

// Test: iterator surface.
// Verifies: forward/backward/mixed consumption of `iter`, `iter_mut`
// updates in place, and Debug prints map syntax in order.
#[test]
fn iterators_meet_in_the_middle() {
    let mut m: TreeMap<u8, u8> = (0..10).map(|k| (k, 0)).collect();
    for (k, v) in m.iter_mut() {
        *v = k * 2;
    }
    let mut it = m.iter();
    assert_eq!(it.len(), 10);
    assert_eq!(it.next(), Some((&0, &0)));
    assert_eq!(it.next_back(), Some((&9, &18)));
    assert_eq!(it.len(), 8);
    let middle: Vec<u8> = it.map(|(k, _)| *k).collect();
    assert_eq!(middle, (1..9).collect::<Vec<_>>());

    let small: TreeMap<u8, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
    assert_eq!(format!("{small:?}"), "{1: 'a', 2: 'b'}");
}
