//! HashSet: the hash engine storing bare keys.

use crate::config::MaxLoad;
use crate::error::{infallible, TryReserveError};
use crate::raw_table::{Lookup, RawIter, RawTable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

pub use crate::raw_table::Cursor;

pub struct HashSet<K, S = DefaultHashBuilder> {
    hasher: S,
    table: RawTable<K>,
    reentrancy: DebugReentrancy,
}

impl<K> HashSet<K, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, S: Default> Default for HashSet<K, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, S> HashSet<K, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config(hasher, MaxLoad::DEFAULT)
    }

    pub fn with_config(hasher: S, max_load: MaxLoad) -> Self {
        Self {
            hasher,
            table: RawTable::new(max_load),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// The hasher keys are hashed with.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn max_load(&self) -> MaxLoad {
        self.table.max_load()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn is_allocated(&self) -> bool {
        self.table.is_allocated()
    }

    pub const fn end(&self) -> Cursor {
        Cursor::END
    }

    pub fn first(&self) -> Cursor {
        self.table.first()
    }

    pub fn next(&self, c: Cursor) -> Cursor {
        self.table.next(c)
    }

    /// Key at `c`, or `None` for `end()` and empty buckets.
    pub fn key_for(&self, c: Cursor) -> Option<&K> {
        self.table.get(c)
    }

    /// Remove the key at `c`; returns the cursor to continue iterating from.
    pub fn erase_itr(&mut self, c: Cursor) -> Cursor {
        let removed = {
            let _g = self.reentrancy.enter();
            self.table.erase(c)
        };
        debug_assert!(removed.is_some(), "erase_itr on a cursor without a key");
        match removed {
            Some((key, next)) => {
                drop(key);
                next
            }
            None => self.table.next(c),
        }
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        let mut c = self.first();
        while let Some(k) = self.table.get(c) {
            c = if f(k) {
                self.table.next(c)
            } else {
                self.erase_itr(c)
            };
        }
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    pub fn cleanup(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.cleanup();
    }

    pub fn reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.table.reserve(n)
    }

    pub fn shrink(&mut self) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.table.shrink()
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter();
        Ok(Self {
            hasher: self.hasher.clone(),
            table: self.table.try_clone()?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.table.iter(),
        }
    }
}

impl<K, S> HashSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn try_with_capacity(n: usize) -> Result<Self, TryReserveError>
    where
        S: Default,
    {
        let mut s = Self::default();
        s.reserve(n)?;
        Ok(s)
    }

    /// Insert `key`, replacing an equal key already present. Returns the
    /// cursor and whether a key was replaced.
    pub fn insert(&mut self, key: K) -> Result<(Cursor, bool), TryReserveError> {
        let (c, displaced) = {
            let _g = self.reentrancy.enter();
            let hash = self.hasher.hash_one(&key);
            match self.table.find_or_reserve(hash, |k| *k == key)? {
                Lookup::Found(c) => (c, Some(self.table.replace(c, key))),
                Lookup::Vacant(slot) => (self.table.fill(slot, hash, key), None),
            }
        };
        let replaced = displaced.is_some();
        drop(displaced);
        Ok((c, replaced))
    }

    /// Insert `key` unless an equal key is present; the flag is true when
    /// it was inserted. An existing key is left untouched.
    pub fn get_or_insert(&mut self, key: K) -> Result<(Cursor, bool), TryReserveError> {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(&key);
        match self.table.find_or_reserve(hash, |k| *k == key)? {
            Lookup::Found(c) => Ok((c, false)),
            Lookup::Vacant(slot) => Ok((self.table.fill(slot, hash, key), true)),
        }
    }

    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_one(q);
        self.table.find(hash, |k| q == <K as Borrow<Q>>::borrow(k))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(self.find(q))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(q).is_end()
    }

    /// Remove and return the key equal to `q`.
    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = {
            let _g = self.reentrancy.enter();
            let hash = self.hasher.hash_one(q);
            let c = self.table.find(hash, |k| q == <K as Borrow<Q>>::borrow(k));
            self.table.erase(c)
        };
        removed.map(|(k, _)| k)
    }

    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }
}

impl<K: Clone, S: Clone> Clone for HashSet<K, S> {
    fn clone(&self) -> Self {
        infallible(self.try_clone())
    }
}

impl<K: fmt::Debug, S> fmt::Debug for HashSet<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Extend<K> for HashSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.reserve(self.len().saturating_add(iter.size_hint().0)));
        for k in iter {
            infallible(self.insert(k));
        }
    }
}

impl<K, S> FromIterator<K> for HashSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut s = Self::default();
        s.extend(iter);
        s
    }
}

impl<'a, K, S> IntoIterator for &'a HashSet<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, K> {
    it: RawIter<'a, K>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
        }
    }
}
