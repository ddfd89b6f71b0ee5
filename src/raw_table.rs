//! RawTable: open-addressing engine shared by `HashMap` and `HashSet`.
//!
//! Layout
//! - `bucket_count` home buckets (a power of two) followed by an overflow
//!   tail. A record's home bucket is the low bits of its hash; probing is
//!   linear and never wraps, so a run that reaches the physical end grows
//!   the tail by one bucket. Every cluster starts at or after a home bucket
//!   and holds at most `len` records, so the tail never exceeds `len`.
//! - One metadata byte per bucket (`group`), parallel to the slot array.
//!   A byte is `EMPTY` iff its slot is `None`.
//! - Each record carries its full hash. Rehashing and backward shift read
//!   the stored hash; user `Hash` code only runs before a record enters.
//!
//! Deletion is tombstone-free: after a bucket is freed, later records of
//! the same run whose home bucket is at or before the gap slide back into
//! it. Since runs never wrap, records only ever move to lower indices,
//! which keeps forward iteration exact under `erase`.
//!
//! The engine knows nothing about keys. Callers pass the hash and an
//! equality predicate over the stored record.

use crate::config::{MaxLoad, MIN_BUCKETS};
use crate::error::{try_reserve, try_reserve_exact, TryReserveError};
use crate::group::{is_full, tag, Group, EMPTY, GROUP_WIDTH};
use core::mem;

/// Position of a record inside a hash container.
///
/// A cursor is a plain bucket index. `Cursor::END` is the same value for
/// every table in every state, so it can be cached and compared against
/// across inserts, erases, growth and `cleanup`. Growth, `shrink` and
/// `reserve` relocate records and invalidate every other cursor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor(usize);

impl Cursor {
    /// One past the last record in iteration order.
    pub const END: Cursor = Cursor(usize::MAX);

    #[inline]
    pub fn is_end(self) -> bool {
        self == Cursor::END
    }
}

#[derive(Clone, Debug)]
struct Entry<T> {
    hash: u64,
    record: T,
}

/// A free bucket located by `find_or_reserve`, with room already reserved.
#[derive(Debug)]
pub(crate) struct VacantSlot(usize);

#[derive(Debug)]
pub(crate) enum Lookup {
    Found(Cursor),
    Vacant(VacantSlot),
}

struct Live<T> {
    ctrl: Vec<u8>,
    slots: Vec<Option<Entry<T>>>,
    bucket_mask: usize,
    len: usize,
}

enum Storage<T> {
    /// No allocation. Read-only operations see an empty table.
    Placeholder,
    Live(Live<T>),
}

pub(crate) struct RawTable<T> {
    storage: Storage<T>,
    max_load: MaxLoad,
}

/// First empty bucket at or after `pos`, or `ctrl.len()` if the run
/// reaches the physical end.
fn first_empty(ctrl: &[u8], mut pos: usize) -> usize {
    loop {
        if let Some(lane) = Group::load(ctrl, pos).match_empty().lowest() {
            return (pos + lane).min(ctrl.len());
        }
        pos += GROUP_WIDTH;
    }
}

/// Grow both arrays so `physical` buckets fit, and always at least one past
/// the current end: the insert that triggered a rebuild may spill into the
/// tail and must not allocate after the rebuild is committed.
fn reserve_physical<T>(
    ctrl: &mut Vec<u8>,
    slots: &mut Vec<Option<Entry<T>>>,
    physical: usize,
) -> Result<(), TryReserveError> {
    let want = physical.max(ctrl.len() + 1);
    try_reserve_exact(ctrl, want - ctrl.len())?;
    try_reserve_exact(slots, want.saturating_sub(slots.len()))
}

/// Metadata for `buckets` home buckets after placing `hashes` in order.
/// Reserves the worst-case tail up front so placement never allocates.
fn plan_ctrl(
    buckets: usize,
    count: usize,
    hashes: impl Iterator<Item = u64>,
) -> Result<Vec<u8>, TryReserveError> {
    let physical = buckets
        .checked_add(count)
        .ok_or(TryReserveError::CapacityOverflow)?;
    let mut ctrl = Vec::new();
    try_reserve_exact(&mut ctrl, physical)?;
    ctrl.resize(buckets, EMPTY);
    let mask = buckets - 1;
    for hash in hashes {
        let idx = first_empty(&ctrl, hash as usize & mask);
        if idx == ctrl.len() {
            ctrl.push(tag(hash));
        } else {
            ctrl[idx] = tag(hash);
        }
    }
    Ok(ctrl)
}

impl<T> Live<T> {
    #[inline]
    fn bucket_count(&self) -> usize {
        self.bucket_mask + 1
    }

    #[inline]
    fn home(&self, hash: u64) -> usize {
        hash as usize & self.bucket_mask
    }

    #[inline]
    fn hash_at(&self, idx: usize) -> u64 {
        self.slots[idx]
            .as_ref()
            .map(|e| e.hash)
            .expect("metadata marks bucket occupied")
    }

    fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        let tag = tag(hash);
        let mut pos = self.home(hash);
        loop {
            let group = Group::load(&self.ctrl, pos);
            let empties = group.match_empty();
            let run_end = empties.lowest().unwrap_or(GROUP_WIDTH);
            for lane in group.match_tag(tag).below(run_end) {
                let idx = pos + lane;
                if let Some(e) = &self.slots[idx] {
                    if e.hash == hash && eq(&e.record) {
                        return Some(idx);
                    }
                }
            }
            if empties.any() {
                return None;
            }
            pos += GROUP_WIDTH;
        }
    }

    fn next_full(&self, mut pos: usize) -> Cursor {
        while pos < self.slots.len() {
            if let Some(lane) = Group::load(&self.ctrl, pos).match_full().lowest() {
                return Cursor(pos + lane);
            }
            pos += GROUP_WIDTH;
        }
        Cursor::END
    }

    /// Build a table of `buckets` home buckets holding every record of
    /// `self`, with room for at least `physical` buckets in all. Nothing in
    /// `self` moves unless every allocation succeeded.
    fn rebuild(&mut self, buckets: usize, physical: usize) -> Result<Live<T>, TryReserveError> {
        let mut ctrl = plan_ctrl(
            buckets,
            self.len,
            self.slots.iter().flatten().map(|e| e.hash),
        )?;
        let mut slots = Vec::new();
        reserve_physical(&mut ctrl, &mut slots, physical)?;
        slots.resize_with(ctrl.len(), || None);

        let mask = buckets - 1;
        for entry in self.slots.iter_mut().filter_map(Option::take) {
            // Same order and the same first-free rule as `plan_ctrl`.
            let mut idx = entry.hash as usize & mask;
            while slots[idx].is_some() {
                idx += 1;
            }
            slots[idx] = Some(entry);
        }
        let len = mem::replace(&mut self.len, 0);
        self.ctrl.fill(EMPTY);
        Ok(Live {
            ctrl,
            slots,
            bucket_mask: mask,
            len,
        })
    }

    /// Remove the record at `idx` and close the gap by backward shift.
    fn take(&mut self, idx: usize) -> T {
        let entry = self.slots[idx]
            .take()
            .expect("erase requires an occupied bucket");
        self.ctrl[idx] = EMPTY;
        self.len -= 1;

        let mut gap = idx;
        let mut j = idx + 1;
        while j < self.slots.len() && is_full(self.ctrl[j]) {
            // A record may fill the gap only if the gap is not before its
            // home bucket; otherwise lookups starting at home would miss it.
            if self.home(self.hash_at(j)) <= gap {
                self.slots.swap(gap, j);
                self.ctrl.swap(gap, j);
                gap = j;
            }
            j += 1;
        }

        let home_buckets = self.bucket_count();
        while self.slots.len() > home_buckets && self.ctrl.last() == Some(&EMPTY) {
            self.ctrl.pop();
            self.slots.pop();
        }
        entry.record
    }

    fn clear(&mut self) {
        let home_buckets = self.bucket_count();
        self.ctrl.truncate(home_buckets);
        self.ctrl.fill(EMPTY);
        self.len = 0;
        self.slots.truncate(home_buckets);
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        T: Clone,
    {
        let mut ctrl = Vec::new();
        try_reserve_exact(&mut ctrl, self.ctrl.len())?;
        ctrl.extend_from_slice(&self.ctrl);
        let mut slots = Vec::new();
        try_reserve_exact(&mut slots, self.slots.len())?;
        // A panicking `T::clone` drops the partial copy on unwind.
        slots.extend(self.slots.iter().cloned());
        Ok(Live {
            ctrl,
            slots,
            bucket_mask: self.bucket_mask,
            len: self.len,
        })
    }
}

impl<T> RawTable<T> {
    pub(crate) const fn new(max_load: MaxLoad) -> Self {
        Self {
            storage: Storage::Placeholder,
            max_load,
        }
    }

    fn live(&self) -> Option<&Live<T>> {
        match &self.storage {
            Storage::Live(t) => Some(t),
            Storage::Placeholder => None,
        }
    }

    fn live_mut(&mut self) -> Option<&mut Live<T>> {
        match &mut self.storage {
            Storage::Live(t) => Some(t),
            Storage::Placeholder => None,
        }
    }

    pub(crate) fn max_load(&self) -> MaxLoad {
        self.max_load
    }

    pub(crate) fn len(&self) -> usize {
        self.live().map_or(0, |t| t.len)
    }

    pub(crate) fn is_allocated(&self) -> bool {
        matches!(self.storage, Storage::Live(_))
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.live().map_or(0, Live::bucket_count)
    }

    /// Records the table holds before the next insert rehashes.
    pub(crate) fn capacity(&self) -> usize {
        self.live()
            .map_or(0, |t| self.max_load.records_for(t.bucket_count()))
    }

    pub(crate) fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Cursor {
        self.live()
            .and_then(|t| t.find(hash, eq))
            .map_or(Cursor::END, Cursor)
    }

    pub(crate) fn get(&self, c: Cursor) -> Option<&T> {
        self.live()?
            .slots
            .get(c.0)?
            .as_ref()
            .map(|e| &e.record)
    }

    pub(crate) fn get_mut(&mut self, c: Cursor) -> Option<&mut T> {
        self.live_mut()?
            .slots
            .get_mut(c.0)?
            .as_mut()
            .map(|e| &mut e.record)
    }

    /// Look up a record; if absent, make room for one more and return the
    /// bucket it goes to. All allocation happens here, before any caller
    /// state moves into the table.
    pub(crate) fn find_or_reserve(
        &mut self,
        hash: u64,
        eq: impl FnMut(&T) -> bool,
    ) -> Result<Lookup, TryReserveError> {
        if let Some(idx) = self.live().and_then(|t| t.find(hash, eq)) {
            return Ok(Lookup::Found(Cursor(idx)));
        }
        self.reserve_for_insert()?;
        let Storage::Live(t) = &mut self.storage else {
            unreachable!("reserve_for_insert leaves the table live");
        };
        let idx = first_empty(&t.ctrl, t.home(hash));
        if idx == t.slots.len() {
            try_reserve(&mut t.ctrl, 1)?;
            try_reserve(&mut t.slots, 1)?;
        }
        Ok(Lookup::Vacant(VacantSlot(idx)))
    }

    /// Store a record in a slot returned by `find_or_reserve`.
    pub(crate) fn fill(&mut self, slot: VacantSlot, hash: u64, record: T) -> Cursor {
        let t = self
            .live_mut()
            .expect("vacant slot implies a live table");
        let idx = slot.0;
        let entry = Some(Entry { hash, record });
        if idx == t.slots.len() {
            log::trace!("overflow tail extended to {} buckets", idx + 1 - t.bucket_count());
            t.ctrl.push(tag(hash));
            t.slots.push(entry);
        } else {
            debug_assert!(t.slots[idx].is_none());
            t.ctrl[idx] = tag(hash);
            t.slots[idx] = entry;
        }
        t.len += 1;
        Cursor(idx)
    }

    /// Swap in a new record for an existing one with an equal key.
    pub(crate) fn replace(&mut self, c: Cursor, record: T) -> T {
        let slot = self
            .get_mut(c)
            .expect("replace requires an occupied bucket");
        mem::replace(slot, record)
    }

    fn reserve_for_insert(&mut self) -> Result<(), TryReserveError> {
        let grow_to = match &self.storage {
            Storage::Placeholder => Some(MIN_BUCKETS),
            Storage::Live(t) if t.len + 1 > self.max_load.records_for(t.bucket_count()) => Some(
                t.bucket_count()
                    .checked_mul(2)
                    .ok_or(TryReserveError::CapacityOverflow)?,
            ),
            Storage::Live(_) => None,
        };
        match grow_to {
            Some(buckets) => self.resize(buckets, 0),
            None => Ok(()),
        }
    }

    /// Move to `buckets` home buckets with room for `physical` buckets in
    /// all (home plus tail).
    fn resize(&mut self, buckets: usize, physical: usize) -> Result<(), TryReserveError> {
        debug_assert!(buckets.is_power_of_two());
        let fresh = match &mut self.storage {
            Storage::Placeholder => {
                log::debug!("allocating table with {buckets} buckets");
                let mut ctrl = plan_ctrl(buckets, 0, core::iter::empty())?;
                let mut slots = Vec::new();
                reserve_physical(&mut ctrl, &mut slots, physical)?;
                slots.resize_with(buckets, || None);
                Live {
                    ctrl,
                    slots,
                    bucket_mask: buckets - 1,
                    len: 0,
                }
            }
            Storage::Live(t) => {
                log::debug!(
                    "rehashing {} records from {} to {} buckets",
                    t.len,
                    t.bucket_count(),
                    buckets
                );
                t.rebuild(buckets, physical)?
            }
        };
        self.storage = Storage::Live(fresh);
        Ok(())
    }

    /// Make room for at least `records` records: no rehash, and no tail
    /// growth allocates, until the table holds more than that.
    pub(crate) fn reserve(&mut self, records: usize) -> Result<(), TryReserveError> {
        if records == 0 {
            return Ok(());
        }
        if records > self.capacity() {
            let buckets = self
                .max_load
                .buckets_for(records)
                .ok_or(TryReserveError::CapacityOverflow)?;
            let physical = buckets
                .checked_add(records)
                .ok_or(TryReserveError::CapacityOverflow)?;
            return self.resize(buckets, physical);
        }
        let t = self.live_mut().expect("nonzero capacity implies a live table");
        let physical = t
            .bucket_count()
            .checked_add(records)
            .ok_or(TryReserveError::CapacityOverflow)?;
        reserve_physical(&mut t.ctrl, &mut t.slots, physical)
    }

    /// Shrink to the smallest bucket count that holds the current records,
    /// or back to the placeholder when empty.
    pub(crate) fn shrink(&mut self) -> Result<(), TryReserveError> {
        let Some(t) = self.live() else {
            return Ok(());
        };
        if t.len == 0 {
            log::debug!("releasing empty table of {} buckets", t.bucket_count());
            self.storage = Storage::Placeholder;
            return Ok(());
        }
        let buckets = self
            .max_load
            .buckets_for(t.len)
            .ok_or(TryReserveError::CapacityOverflow)?;
        if buckets < t.bucket_count() {
            self.resize(buckets, 0)?;
        }
        Ok(())
    }

    /// Remove the record at `c`, returning it and the cursor to continue
    /// iteration from. A record shifted back into `c` has not been visited
    /// yet, so the continuation is `c` itself whenever it was refilled.
    pub(crate) fn erase(&mut self, c: Cursor) -> Option<(T, Cursor)> {
        let t = self.live_mut()?;
        if !t.ctrl.get(c.0).copied().is_some_and(is_full) {
            return None;
        }
        let record = t.take(c.0);
        Some((record, t.next_full(c.0)))
    }

    pub(crate) fn clear(&mut self) {
        if let Some(t) = self.live_mut() {
            t.clear();
        }
    }

    /// Drop every record and release the allocation.
    pub(crate) fn cleanup(&mut self) {
        if self.is_allocated() {
            log::debug!("table returned to placeholder");
        }
        self.storage = Storage::Placeholder;
    }

    pub(crate) fn first(&self) -> Cursor {
        self.live().map_or(Cursor::END, |t| t.next_full(0))
    }

    pub(crate) fn next(&self, c: Cursor) -> Cursor {
        match self.live() {
            Some(t) if c.0 < t.slots.len() => t.next_full(c.0 + 1),
            _ => Cursor::END,
        }
    }

    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        T: Clone,
    {
        let storage = match &self.storage {
            Storage::Live(t) if t.len > 0 => Storage::Live(t.try_clone()?),
            _ => Storage::Placeholder,
        };
        Ok(Self {
            storage,
            max_load: self.max_load,
        })
    }

    pub(crate) fn iter(&self) -> RawIter<'_, T> {
        let (slots, remaining): (&[Option<Entry<T>>], usize) = match &self.storage {
            Storage::Live(t) => (t.slots.as_slice(), t.len),
            Storage::Placeholder => (Default::default(), 0),
        };
        RawIter {
            it: slots.iter(),
            remaining,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> RawIterMut<'_, T> {
        let (slots, remaining): (&mut [Option<Entry<T>>], usize) = match &mut self.storage {
            Storage::Live(t) => (t.slots.as_mut_slice(), t.len),
            Storage::Placeholder => (Default::default(), 0),
        };
        RawIterMut {
            it: slots.iter_mut(),
            remaining,
        }
    }

    /// Check every structural invariant; used by tests after each step.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let Some(t) = self.live() else {
            return;
        };
        assert!(t.bucket_count().is_power_of_two());
        assert!(t.bucket_count() >= MIN_BUCKETS);
        assert_eq!(t.ctrl.len(), t.slots.len());
        assert!(t.slots.len() >= t.bucket_count());
        assert!(
            t.slots.len() == t.bucket_count() || t.ctrl.last() != Some(&EMPTY),
            "trailing empty overflow bucket"
        );
        let mut count = 0;
        for (idx, (ctrl, slot)) in t.ctrl.iter().zip(&t.slots).enumerate() {
            match slot {
                None => assert_eq!(*ctrl, EMPTY, "bucket {idx} empty but tagged"),
                Some(e) => {
                    count += 1;
                    assert_eq!(*ctrl, tag(e.hash), "bucket {idx} tag mismatch");
                    let home = t.home(e.hash);
                    assert!(home <= idx, "bucket {idx} sits before its home {home}");
                    assert!(
                        t.ctrl[home..idx].iter().all(|&c| is_full(c)),
                        "bucket {idx} unreachable from home {home}"
                    );
                }
            }
        }
        assert_eq!(count, t.len);
        assert!(t.len <= self.max_load.records_for(t.bucket_count()));
    }
}

pub(crate) struct RawIter<'a, T> {
    it: core::slice::Iter<'a, Option<Entry<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for RawIter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        for slot in self.it.by_ref() {
            if let Some(e) = slot {
                self.remaining -= 1;
                return Some(&e.record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RawIter<'_, T> {}

impl<T> Clone for RawIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

pub(crate) struct RawIterMut<'a, T> {
    it: core::slice::IterMut<'a, Option<Entry<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for RawIterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        for slot in self.it.by_ref() {
            if let Some(e) = slot {
                self.remaining -= 1;
                return Some(&mut e.record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for RawIterMut<'_, T> {}
