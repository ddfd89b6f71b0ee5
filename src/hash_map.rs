//! HashMap: key/value wrapper over `RawTable` with a pluggable hasher.
//!
//! The map hashes each key once with its `BuildHasher`, hands the hash and
//! an equality predicate to the engine, and stores `(K, V)` records.
//! Lookups accept any borrowed form `Q` of the key whose `Hash` and `Eq`
//! agree with `K`'s (for example `&str` against `String` keys).

use crate::config::MaxLoad;
use crate::error::{infallible, TryReserveError};
use crate::raw_table::{Lookup, RawIter, RawIterMut, RawTable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

pub use crate::raw_table::Cursor;

pub struct HashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    table: RawTable<(K, V)>,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S: Default> Default for HashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// An empty map. Does not allocate until the first insert or `reserve`.
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

    /// Records the map holds before an insert has to rehash.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Whether the map owns backing storage (false for the placeholder).
    pub fn is_allocated(&self) -> bool {
        self.table.is_allocated()
    }

    /// The boundary cursor. Identical for every map, before and after any
    /// mutation.
    pub const fn end(&self) -> Cursor {
        Cursor::END
    }

    /// First record in bucket order, or `end()` when empty.
    pub fn first(&self) -> Cursor {
        self.table.first()
    }

    /// Next record in bucket order, or `end()` after the last.
    pub fn next(&self, c: Cursor) -> Cursor {
        self.table.next(c)
    }

    /// Key of the record at `c`, or `None` for `end()` and empty buckets.
    /// A cursor taken before an erase may name a record shifted into its
    /// bucket; only the cursor `erase_itr` returns is kept exact.
    pub fn key_for(&self, c: Cursor) -> Option<&K> {
        self.table.get(c).map(|(k, _)| k)
    }

    /// Value of the record at `c`, under the same rules as `key_for`.
    pub fn value(&self, c: Cursor) -> Option<&V> {
        self.table.get(c).map(|(_, v)| v)
    }

    pub fn value_mut(&mut self, c: Cursor) -> Option<&mut V> {
        self.table.get_mut(c).map(|(_, v)| v)
    }

    /// Remove the record at `c` and return the cursor to continue iterating
    /// from. Every record not yet visited is still reached exactly once.
    ///
    /// `c` must name a live record; `end()` or a stale cursor is a caller
    /// bug (debug-asserted) and leaves the map unchanged.
    pub fn erase_itr(&mut self, c: Cursor) -> Cursor {
        let removed = {
            let _g = self.reentrancy.enter();
            self.table.erase(c)
        };
        debug_assert!(removed.is_some(), "erase_itr on a cursor without a record");
        match removed {
            Some((record, next)) => {
                drop(record);
                next
            }
            None => self.table.next(c),
        }
    }

    /// Keep only the records for which `f` returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut c = self.first();
        while let Some((k, v)) = self.table.get_mut(c) {
            c = if f(k, v) {
                self.table.next(c)
            } else {
                self.erase_itr(c)
            };
        }
    }

    /// Drop every record; keeps the allocation.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    /// Drop every record and release the allocation, returning to the
    /// placeholder state.
    pub fn cleanup(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.cleanup();
    }

    /// Ensure at least `n` records fit without rehashing.
    pub fn reserve(&mut self, n: usize) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.table.reserve(n)
    }

    /// Release spare capacity; an empty map returns to the placeholder.
    pub fn shrink(&mut self) -> Result<(), TryReserveError> {
        let _g = self.reentrancy.enter();
        self.table.shrink()
    }

    pub fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let _g = self.reentrancy.enter();
        Ok(Self {
            hasher: self.hasher.clone(),
            table: self.table.try_clone()?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.table.check_invariants();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Allocate room for `n` records up front.
    pub fn try_with_capacity(n: usize) -> Result<Self, TryReserveError>
    where
        S: Default,
    {
        let mut m = Self::default();
        m.reserve(n)?;
        Ok(m)
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Insert or overwrite. On an existing key the stored key and value are
    /// dropped and replaced. Returns the record's cursor and whether a
    /// record was replaced. Growth invalidates all earlier cursors.
    pub fn insert(&mut self, key: K, value: V) -> Result<(Cursor, bool), TryReserveError> {
        let (c, displaced) = {
            let _g = self.reentrancy.enter();
            let hash = self.make_hash(&key);
            match self.table.find_or_reserve(hash, |(k, _)| *k == key)? {
                Lookup::Found(c) => (c, Some(self.table.replace(c, (key, value)))),
                Lookup::Vacant(slot) => (self.table.fill(slot, hash, (key, value)), None),
            }
        };
        let replaced = displaced.is_some();
        drop(displaced);
        Ok((c, replaced))
    }

    /// Return the existing record for `key`, or insert `(key, value)`.
    /// The flag is true when a record was inserted; otherwise `key` and
    /// `value` are dropped.
    pub fn get_or_insert(&mut self, key: K, value: V) -> Result<(Cursor, bool), TryReserveError> {
        self.get_or_insert_with(key, || value)
    }

    /// Like `get_or_insert`, but builds the value only when inserting.
    pub fn get_or_insert_with<F>(
        &mut self,
        key: K,
        default: F,
    ) -> Result<(Cursor, bool), TryReserveError>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        match self.table.find_or_reserve(hash, |(k, _)| *k == key)? {
            Lookup::Found(c) => Ok((c, false)),
            Lookup::Vacant(slot) => {
                let value = default();
                Ok((self.table.fill(slot, hash, (key, value)), true))
            }
        }
    }

    /// Cursor of the record for `q`, or `end()`.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.table.find(hash, |(k, _)| q == <K as Borrow<Q>>::borrow(k))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.value(self.find(q))
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(self.find(q)).map(|(k, v)| (k, v))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let c = self.find(q);
        self.value_mut(c)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(q).is_end()
    }

    /// Remove the record for `q` and return its value.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = {
            let _g = self.reentrancy.enter();
            let hash = self.make_hash(q);
            let c = self.table.find(hash, |(k, _)| q == <K as Borrow<Q>>::borrow(k));
            self.table.erase(c)
        };
        removed.map(|((_k, v), _)| v)
    }

    /// Drop the record for `q`. Returns whether one was present.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(q).is_some()
    }
}

impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        infallible(self.try_clone())
    }
}

impl<K, V, S> fmt::Debug for HashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.reserve(self.len().saturating_add(iter.size_hint().0)));
        for (k, v) in iter {
            infallible(self.insert(k, v));
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::default();
        m.extend(iter);
        m
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    it: RawIter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
        }
    }
}

/// Iterator over `(&K, &mut V)` in bucket order.
pub struct IterMut<'a, K, V> {
    it: RawIterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
