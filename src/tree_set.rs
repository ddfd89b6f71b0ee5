//! TreeSet: the tree engine storing bare keys.

use crate::compare::{Comparator, Natural};
use crate::error::{infallible, TryReserveError};
use crate::rb_tree::{Lookup, RawIter, RbTree};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::ops::{Bound, RangeBounds};

pub use crate::rb_tree::Cursor;

pub struct TreeSet<K, C = Natural> {
    cmp: C,
    tree: RbTree<K>,
    reentrancy: DebugReentrancy,
}

#[inline]
fn order<K, Q, C>(cmp: &C, q: &Q, k: &K) -> Ordering
where
    K: Borrow<Q>,
    C: Comparator<Q>,
    Q: ?Sized,
{
    Comparator::<Q>::compare(cmp, q, <K as Borrow<Q>>::borrow(k))
}

impl<K> TreeSet<K, Natural> {
    pub const fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, C: Default> Default for TreeSet<K, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, C> TreeSet<K, C> {
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            cmp,
            tree: RbTree::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

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

    pub fn first(&self) -> Cursor {
        self.tree.first()
    }

    pub fn last(&self) -> Cursor {
        self.tree.last()
    }

    /// Next larger key, or `end()`.
    pub fn next(&self, c: Cursor) -> Cursor {
        self.tree.next(c)
    }

    pub fn prev(&self, c: Cursor) -> Cursor {
        self.tree.prev(c)
    }

    /// Key at `c`; `None` for a boundary or an erased record's cursor.
    pub fn key_for(&self, c: Cursor) -> Option<&K> {
        self.tree.get(c)
    }

    /// Remove the key at `c`; returns the cursor of its successor.
    pub fn erase_itr(&mut self, c: Cursor) -> Cursor {
        let removed = {
            let _g = self.reentrancy.enter();
            self.tree.erase(c)
        };
        debug_assert!(removed.is_some(), "erase_itr on a cursor without a key");
        match removed {
            Some((key, next)) => {
                drop(key);
                next
            }
            None => self.tree.next(c),
        }
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        let mut c = self.first();
        while let Some(k) = self.tree.get(c) {
            c = if f(k) {
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

    pub fn cleanup(&mut self) {
        let _g = self.reentrancy.enter();
        self.tree.cleanup();
    }

    pub fn reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.tree.reserve(n)
    }

    pub fn shrink(&mut self) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.tree.shrink()
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        C: Clone,
    {
        let _g = self.reentrancy.enter();
        Ok(Self {
            cmp: self.cmp.clone(),
            tree: self.tree.try_clone()?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.tree.iter(),
            remaining: self.len(),
        }
    }
}

impl<K, C> TreeSet<K, C>
where
    C: Comparator<K>,
{
    /// Insert `key`, replacing an equal key already present. Returns the
    /// cursor and whether a key was replaced.
    pub fn insert(&mut self, key: K) -> Result<(Cursor, bool), TryReserveError> {
        let (c, displaced) = {
            let _g = self.reentrancy.enter();
            let cmp = &self.cmp;
            match self
                .tree
                .find_or_reserve(|k| Comparator::<K>::compare(cmp, &key, k))?
            {
                Lookup::Found(c) => (c, Some(self.tree.replace(c, key))),
                Lookup::Vacant(slot) => (self.tree.fill(slot, key), None),
            }
        };
        let replaced = displaced.is_some();
        drop(displaced);
        Ok((c, replaced))
    }

    /// Insert `key` unless an equal key is present; the flag is true when
    /// it was inserted.
    pub fn get_or_insert(&mut self, key: K) -> Result<(Cursor, bool), TryReserveError> {
        let _g = self.reentrancy.enter();
        let cmp = &self.cmp;
        match self
            .tree
            .find_or_reserve(|k| Comparator::<K>::compare(cmp, &key, k))?
        {
            Lookup::Found(c) => Ok((c, false)),
            Lookup::Vacant(slot) => Ok((self.tree.fill(slot, key), true)),
        }
    }

    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        self.tree.find(|k| order(&self.cmp, q, k))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get(self.find(q))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        !self.find(q).is_end()
    }

    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let removed = {
            let _g = self.reentrancy.enter();
            let cmp = &self.cmp;
            let c = self.tree.find(|k| order(cmp, q, k));
            self.tree.erase(c)
        };
        removed.map(|(k, _)| k)
    }

    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.take(q).is_some()
    }

    /// First key `>= q`, or `end()`.
    pub fn first_at_or_after<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        self.tree
            .seek_first(|k| order(&self.cmp, q, k) != Ordering::Greater)
    }

    /// Last key `<= q`, or `r_end()`.
    pub fn last_at_or_before<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let _g = self.reentrancy.enter();
        self.tree
            .seek_last(|k| order(&self.cmp, q, k) != Ordering::Less)
    }

    pub fn range<Q, R>(&self, range: R) -> Range<'_, K>
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
                .seek_first(|k| order(cmp, q, k) != Ordering::Greater),
            Bound::Excluded(q) => self.tree.seek_first(|k| order(cmp, q, k) == Ordering::Less),
            Bound::Unbounded => self.tree.first(),
        };
        let back = match range.end_bound() {
            Bound::Included(q) => self.tree.seek_last(|k| order(cmp, q, k) != Ordering::Less),
            Bound::Excluded(q) => self
                .tree
                .seek_last(|k| order(cmp, q, k) == Ordering::Greater),
            Bound::Unbounded => self.tree.last(),
        };
        let nonempty = match (self.tree.get(front), self.tree.get(back)) {
            (Some(fk), Some(bk)) => Comparator::<K>::compare(cmp, fk, bk) != Ordering::Greater,
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

impl<K: Clone, C: Clone> Clone for TreeSet<K, C> {
    fn clone(&self) -> Self {
        infallible(self.try_clone())
    }
}

impl<K: fmt::Debug, C> fmt::Debug for TreeSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C: Comparator<K>> Extend<K> for TreeSet<K, C> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.reserve(self.len().saturating_add(iter.size_hint().0)));
        for k in iter {
            infallible(self.insert(k));
        }
    }
}

impl<K, C: Comparator<K> + Default> FromIterator<K> for TreeSet<K, C> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut s = Self::default();
        s.extend(iter);
        s
    }
}

impl<'a, K, C> IntoIterator for &'a TreeSet<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, K> {
    it: RawIter<'a, K>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let k = self.it.next()?;
        self.remaining -= 1;
        Some(k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let k = self.it.next_back()?;
        self.remaining -= 1;
        Some(k)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

pub struct Range<'a, K> {
    it: RawIter<'a, K>,
}

impl<'a, K> Iterator for Range<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.it.next()
    }
}

impl<K> DoubleEndedIterator for Range<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back()
    }
}
