//! TreeMap: key/value wrapper over `RbTree`, ordered by a `Comparator`.
//!
//! Cursors name records, not positions: a cursor stays valid until its own
//! record is erased, whatever else is inserted or erased meanwhile.
//!
//! Range walks come in two shapes. Forward, `[first_at_or_after(lo),
//! first_at_or_after(hi))` stepping with `next`; backward, `[last_at_or_before(hi),
//! last_at_or_before(lo))` stepping with `prev`. Both stop at the shared
//! boundary cursor when a bound lies beyond the stored keys. `range` wraps
//! the same lookups into an iterator.

use crate::compare::{Comparator, Natural};
use crate::error::{infallible, TryReserveError};
use crate::rb_tree::{Lookup, RawIter, RawIterMut, RbTree};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::ops::{Bound, RangeBounds};

pub use crate::rb_tree::Cursor;

pub struct TreeMap<K, V, C = Natural> {
    cmp: C,
    tree: RbTree<(K, V)>,
    reentrancy: DebugReentrancy,
}

/// Order a borrowed query against a stored key.
#[inline]
fn order<K, Q, C>(cmp: &C, q: &Q, k: &K) -> Ordering
where
    K: Borrow<Q>,
    C: Comparator<Q>,
    Q: ?Sized,
{
    Comparator::<Q>::compare(cmp, q, <K as Borrow<Q>>::borrow(k))
}

impl<K, V> TreeMap<K, V, Natural> {
    pub const fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, V, C: Default> Default for TreeMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    /// An empty map ordered by `cmp`. Does not allocate.
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            cmp,
            tree: RbTree::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// The order keys are kept in.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records the map holds before it has to allocate.
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    pub fn is_allocated(&self) -> bool {
        self.tree.is_allocated()
    }

    pub const fn end(&self) -> Cursor {
        Cursor::END
    }

    pub const fn r_end(&self) -> Cursor {
        Cursor::R_END
    }

    /// Smallest key, or `end()` when empty.
    pub fn first(&self) -> Cursor {
        self.tree.first()
    }

    /// Largest key, or `r_end()` when empty.
    pub fn last(&self) -> Cursor {
        self.tree.last()
    }

    /// Next larger key; `end()` after the last one or for a stale cursor.
    pub fn next(&self, c: Cursor) -> Cursor {
        self.tree.next(c)
    }

    /// Next smaller key; `r_end()` before the first one or for a stale cursor.
    pub fn prev(&self, c: Cursor) -> Cursor {
        self.tree.prev(c)
    }

    /// Key of the record at `c`. `None` for a boundary or for a cursor
    /// whose record has been erased, even if the map has since grown.
    pub fn key_for(&self, c: Cursor) -> Option<&K> {
        self.tree.get(c).map(|(k, _)| k)
    }

    /// Value of the record at `c`, under the same rules as `key_for`.
    pub fn value(&self, c: Cursor) -> Option<&V> {
        self.tree.get(c).map(|(_, v)| v)
    }

    pub fn value_mut(&mut self, c: Cursor) -> Option<&mut V> {
        self.tree.get_mut(c).map(|(_, v)| v)
    }

    /// Remove the record at `c` and return the cursor of its successor.
    ///
    /// `c` must name a live record; `end()` or a stale cursor is a caller
    /// bug (debug-asserted) and leaves the map unchanged.
    pub fn erase_itr(&mut self, c: Cursor) -> Cursor {
        let removed = {
            let _g = self.reentrancy.enter();
            self.tree.erase(c)
        };
        debug_assert!(removed.is_some(), "erase_itr on a cursor without a record");
        match removed {
            Some((record, next)) => {
                drop(record);
                next
            }
            None => self.tree.next(c),
        }
    }

    /// Keep only the records for which `f` returns true, visiting in order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut c = self.first();
        while let Some((k, v)) = self.tree.get_mut(c) {
            c = if f(k, v) {
                self.tree.next(c)
            } else {
                self.erase_itr(c)
            };
        }
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.tree.clear();
    }

    /// Drop every record and release the node pool.
    pub fn cleanup(&mut self) {
        let _g = self.reentrancy.enter();
        self.tree.cleanup();
    }

    /// Ensure `n` records fit without allocating.
    pub fn reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.tree.reserve(n)
    }

    /// Return an empty map to the placeholder. A non-empty map keeps its
    /// node slots, and every cursor stays valid.
    pub fn shrink(&mut self) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.tree.shrink()
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        let _g = self.reentrancy.enter();
        Ok(Self {
            cmp: self.cmp.clone(),
            tree: self.tree.try_clone()?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.tree.iter(),
            remaining: self.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        IterMut {
            it: self.tree.iter_mut(),
            remaining,
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, C> TreeMap<K, V, C>
where
    C: Comparator<K>,
{
    /// Insert or overwrite. On an existing key the stored key and value are
    /// dropped and replaced. Returns the cursor and whether a record was
    /// replaced.
    pub fn insert(&mut self, key: K, value: V) -> Result<(Cursor, bool), TryReserveError> {
        let (c, displaced) = {
            let _g = self.reentrancy.enter();
            let cmp = &self.cmp;
            match self
                .tree
                .find_or_reserve(|(k, _)| Comparator::<K>::compare(cmp, &key, k))?
            {
                Lookup::Found(c) => (c, Some(self.tree.replace(c, (key, value)))),
                Lookup::Vacant(slot) => (self.tree.fill(slot, (key, value)), None),
            }
        };
        let replaced = displaced.is_some();
        drop(displaced);
        Ok((c, replaced))
    }

    /// Return the existing record for `key`, or insert `(key, value)`.
    /// The flag is true when a record was inserted.
    pub fn get_or_insert(&mut self, key: K, value: V) -> Result<(Cursor, bool), TryReserveError> {
        self.get_or_insert_with(key, || value)
    }

    pub fn get_or_insert_with<F>(
        &mut self,
        key: K,
        default: F,
    ) -> Result<(Cursor, bool), TryReserveError>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let cmp = &self.cmp;
        match self
            .tree
            .find_or_reserve(|(k, _)| Comparator::<K>::compare(cmp, &key, k))?
        {
            Lookup::Found(c) => Ok((c, false)),
            Lookup::Vacant(slot) => {
                let value = default();
                Ok((self.tree.fill(slot, (key, value)), true))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let cmp = &self.cmp;
        self.tree
            .check_invariants(|a, b| Comparator::<K>::compare(cmp, &a.0, &b.0));
    }

    /// Cursor of the record for `q`, or `end()`.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        self.tree.find(|(k, _)| order(&self.cmp, q, k))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.value(self.find(q))
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get(self.find(q)).map(|(k, v)| (k, v))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let c = self.find(q);
        self.value_mut(c)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        !self.find(q).is_end()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let removed = {
            let _g = self.reentrancy.enter();
            let cmp = &self.cmp;
            let c = self.tree.find(|(k, _)| order(cmp, q, k));
            self.tree.erase(c)
        };
        removed.map(|((_k, v), _)| v)
    }

    /// Drop the record for `q`. Returns whether one was present.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.remove(q).is_some()
    }

    /// First record with key `>= q`, or `end()`.
    pub fn first_at_or_after<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        self.tree
            .seek_first(|(k, _)| order(&self.cmp, q, k) != Ordering::Greater)
    }

    /// Last record with key `<= q`, or `r_end()`.
    pub fn last_at_or_before<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        self.tree
            .seek_last(|(k, _)| order(&self.cmp, q, k) != Ordering::Less)
    }

    /// Records whose keys fall in `range`, in order.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let _g = self.reentrancy.enter();
        let cmp = &self.cmp;
        let front = match range.start_bound() {
            Bound::Included(q) => self
                .tree
                .seek_first(|(k, _)| order(cmp, q, k) != Ordering::Greater),
            Bound::Excluded(q) => self
                .tree
                .seek_first(|(k, _)| order(cmp, q, k) == Ordering::Less),
            Bound::Unbounded => self.tree.first(),
        };
        let back = match range.end_bound() {
            Bound::Included(q) => self
                .tree
                .seek_last(|(k, _)| order(cmp, q, k) != Ordering::Less),
            Bound::Excluded(q) => self
                .tree
                .seek_last(|(k, _)| order(cmp, q, k) == Ordering::Greater),
            Bound::Unbounded => self.tree.last(),
        };
        let nonempty = match (self.tree.get(front), self.tree.get(back)) {
            (Some((fk, _)), Some((bk, _))) => {
                Comparator::<K>::compare(cmp, fk, bk) != Ordering::Greater
            }
            _ => false,
        };
        let it = if nonempty {
            self.tree.iter_between(front, back)
        } else {
            self.tree.iter_between(Cursor::END, Cursor::R_END)
        };
        Range { it }
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for TreeMap<K, V, C> {
    fn clone(&self) -> Self {
        infallible(self.try_clone())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.reserve(self.len().saturating_add(iter.size_hint().0)));
        for (k, v) in iter {
            infallible(self.insert(k, v));
        }
    }
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for TreeMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::default();
        m.extend(iter);
        m
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over `(&K, &V)`.
pub struct Iter<'a, K, V> {
    it: RawIter<'a, (K, V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.it.next()?;
        self.remaining -= 1;
        Some((k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (k, v) = self.it.next_back()?;
        self.remaining -= 1;
        Some((k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

/// In-order iterator over `(&K, &mut V)`.
pub struct IterMut<'a, K, V> {
    it: RawIterMut<'a, (K, V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let (k, v) = self.it.next()?;
        self.remaining -= 1;
        Some((&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (k, v) = self.it.next_back()?;
        self.remaining -= 1;
        Some((&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Records within a key range, in order. Returned by `TreeMap::range`.
pub struct Range<'a, K, V> {
    it: RawIter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (k, v))
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(k, v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Reversed;

    fn check<K: Ord, V>(m: &TreeMap<K, V>) {
        m.tree.check_invariants(|a, b| a.0.cmp(&b.0));
    }

    #[test]
    fn insert_overwrites_and_keeps_cursor() {
        let mut m = TreeMap::new();
        let (c, replaced) = m.insert(3, "three").unwrap();
        assert!(!replaced);
        let (c2, replaced) = m.insert(3, "THREE").unwrap();
        assert!(replaced);
        assert_eq!(c, c2);
        assert_eq!(m.value(c), Some(&"THREE"));
        check(&m);
    }

    #[test]
    fn heterogeneous_lookup_with_str() {
        let mut m: TreeMap<String, u32> = TreeMap::new();
        for (i, w) in ["pear", "apple", "fig"].iter().enumerate() {
            m.insert(w.to_string(), i as u32).unwrap();
        }
        assert_eq!(m.get("apple"), Some(&1));
        assert!(m.contains_key("fig"));
        assert_eq!(m.remove("pear"), Some(0));
        assert!(!m.erase("pear"));
        assert_eq!(m.keys().map(String::as_str).collect::<Vec<_>>(), vec!["apple", "fig"]);
    }

    #[test]
    fn reversed_comparator_orders_descending() {
        let mut m = TreeMap::with_comparator(Reversed(Natural));
        for k in [2, 9, 4, 7] {
            m.insert(k, ()).unwrap();
        }
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![9, 7, 4, 2]);
        // "At or after" follows the map's own order.
        let c = m.first_at_or_after(&5);
        assert_eq!(m.key_for(c), Some(&4));
    }

    #[test]
    fn closure_comparator() {
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len()).then(a.cmp(b));
        let mut m = TreeMap::with_comparator(by_len);
        for w in ["ccc", "a", "bb", "aa"] {
            m.insert(w, w.len()).unwrap();
        }
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec!["a", "aa", "bb", "ccc"]);
    }

    #[test]
    fn bounds_and_boundaries() {
        let m: TreeMap<i32, i32> = (0..10).map(|k| (k * 10, k)).collect();
        assert_eq!(m.key_for(m.first_at_or_after(&35)), Some(&40));
        assert_eq!(m.key_for(m.last_at_or_before(&35)), Some(&30));
        assert_eq!(m.first_at_or_after(&91), m.end());
        assert_eq!(m.last_at_or_before(&-1), m.r_end());
        assert_eq!(m.first_at_or_after(&-100), m.first());
        assert_eq!(m.last_at_or_before(&1000), m.last());
        assert_eq!(m.prev(m.first()), m.r_end());
        assert_eq!(m.next(m.last()), m.end());
    }

    #[test]
    fn range_bounds() {
        fn keys(r: Range<'_, u32, ()>) -> Vec<u32> {
            r.map(|(k, _)| *k).collect()
        }
        let m: TreeMap<u32, ()> = (0..20).map(|k| (k, ())).collect();
        assert_eq!(keys(m.range(5..8)), vec![5, 6, 7]);
        assert_eq!(keys(m.range(5..=8)), vec![5, 6, 7, 8]);
        assert_eq!(keys(m.range(17..)), vec![17, 18, 19]);
        assert_eq!(keys(m.range(..2)), vec![0, 1]);
        assert_eq!(keys(m.range((Bound::Excluded(3), Bound::Excluded(6)))), vec![4, 5]);
        assert!(keys(m.range(8..8)).is_empty());
        assert!(keys(m.range(30..40)).is_empty());
        assert_eq!(m.range::<u32, _>(..).count(), 20);
        assert_eq!(m.range(3..7).rev().map(|(k, _)| *k).collect::<Vec<_>>(), vec![6, 5, 4, 3]);
    }

    #[test]
    fn iter_mut_updates_in_order() {
        let mut m: TreeMap<u32, u32> = [(3, 0), (1, 0), (2, 0)].into_iter().collect();
        let mut n = 0;
        for (_, v) in m.iter_mut() {
            n += 1;
            *v = n;
        }
        assert_eq!(m.values().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(m.iter().len(), 3);
    }

    #[test]
    fn retain_in_order() {
        let mut m: TreeMap<u32, u32> = (0..50).map(|k| (k, k)).collect();
        let mut visited = Vec::new();
        m.retain(|k, _| {
            visited.push(*k);
            k % 4 == 0
        });
        assert_eq!(visited, (0..50).collect::<Vec<_>>());
        assert_eq!(m.len(), 13);
        check(&m);
    }

    #[test]
    fn get_or_insert_with_is_lazy() {
        let mut m: TreeMap<u8, String> = TreeMap::new();
        m.get_or_insert_with(1, || "one".into()).unwrap();
        let (c, inserted) = m
            .get_or_insert_with(1, || panic!("constructor ran for a present key"))
            .unwrap();
        assert!(!inserted);
        assert_eq!(m.value(c).map(String::as_str), Some("one"));
    }
}
