//! RbTree: the ordered tree engine behind `TreeMap` and `TreeSet`.
//!
//! ## Layout
//!
//! Nodes live in a `SlotMap` and link by its generational key. Every link
//! is an `Option<DefaultKey>`; `None` plays the nil node: parent of the root, child
//! of every leaf, and the boundary returned when a walk runs off either
//! end. Nil counts as black.
//!
//! The engine never compares records itself. Callers pass either a closure
//! that orders the query against a stored record (`find`,
//! `find_or_reserve`), or a monotone predicate over records (`seek_first`,
//! `seek_last`).
//!
//! ## Stability
//!
//! Erasing a node with two children relinks its in-order successor into
//! its place instead of moving the successor's record, and no operation
//! other than erase frees a node. A cursor therefore stays valid until the
//! record it names is erased, across inserts, rotations, `reserve` and
//! `shrink`. Once erased, the key's generation is retired: a stale cursor
//! reads as `None` even after its slot is reused.

use crate::error::TryReserveError;
use core::alloc::Layout;
use core::cmp::Ordering;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Position of a record inside a tree container.
///
/// `Cursor::END` and `Cursor::R_END` are the same nil value: one past the
/// largest record walking forward, one before the smallest walking back.
/// It is identical for every tree in every state.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor(Option<DefaultKey>);

impl Cursor {
    pub const END: Cursor = Cursor(None);
    pub const R_END: Cursor = Cursor(None);

    /// True for the nil boundary (`END` or `R_END`).
    #[inline]
    pub fn is_end(self) -> bool {
        self.0.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone)]
struct Node<T> {
    record: T,
    parent: Option<DefaultKey>,
    left: Option<DefaultKey>,
    right: Option<DefaultKey>,
    color: Color,
}

/// Where a missing record would be linked. Room for one node is already
/// reserved.
#[derive(Debug)]
pub(crate) struct VacantSlot {
    parent: Option<DefaultKey>,
    left: bool,
}

#[derive(Debug)]
pub(crate) enum Lookup {
    Found(Cursor),
    Vacant(VacantSlot),
}

struct Live<T> {
    nodes: SlotMap<DefaultKey, Node<T>>,
    root: Option<DefaultKey>,
}

enum Storage<T> {
    Placeholder,
    Live(Live<T>),
}

pub(crate) struct RbTree<T> {
    storage: Storage<T>,
}

impl<T> Live<T> {
    fn new() -> Self {
        Self {
            nodes: SlotMap::new(),
            root: None,
        }
    }

    #[inline]
    fn node(&self, id: DefaultKey) -> &Node<T> {
        &self.nodes[id]
    }

    #[inline]
    fn node_mut(&mut self, id: DefaultKey) -> &mut Node<T> {
        &mut self.nodes[id]
    }

    #[inline]
    fn parent(&self, id: DefaultKey) -> Option<DefaultKey> {
        self.node(id).parent
    }

    #[inline]
    fn left(&self, id: DefaultKey) -> Option<DefaultKey> {
        self.node(id).left
    }

    #[inline]
    fn right(&self, id: DefaultKey) -> Option<DefaultKey> {
        self.node(id).right
    }

    #[inline]
    fn color(&self, x: Option<DefaultKey>) -> Color {
        x.map_or(Color::Black, |id| self.node(id).color)
    }

    #[inline]
    fn is_red(&self, x: Option<DefaultKey>) -> bool {
        self.color(x) == Color::Red
    }

    #[inline]
    fn set_color(&mut self, x: Option<DefaultKey>, color: Color) {
        if let Some(id) = x {
            self.node_mut(id).color = color;
        }
    }

    #[inline]
    fn set_parent(&mut self, x: Option<DefaultKey>, parent: Option<DefaultKey>) {
        if let Some(id) = x {
            self.node_mut(id).parent = parent;
        }
    }

    fn minimum(&self, mut id: DefaultKey) -> DefaultKey {
        while let Some(l) = self.left(id) {
            id = l;
        }
        id
    }

    fn maximum(&self, mut id: DefaultKey) -> DefaultKey {
        while let Some(r) = self.right(id) {
            id = r;
        }
        id
    }

    fn successor(&self, id: DefaultKey) -> Option<DefaultKey> {
        if let Some(r) = self.right(id) {
            return Some(self.minimum(r));
        }
        let mut x = id;
        while let Some(p) = self.parent(x) {
            if self.left(p) == Some(x) {
                return Some(p);
            }
            x = p;
        }
        None
    }

    fn predecessor(&self, id: DefaultKey) -> Option<DefaultKey> {
        if let Some(l) = self.left(id) {
            return Some(self.maximum(l));
        }
        let mut x = id;
        while let Some(p) = self.parent(x) {
            if self.right(p) == Some(x) {
                return Some(p);
            }
            x = p;
        }
        None
    }

    /// Point `parent`'s link to `old` at `new` instead (the root link when
    /// `parent` is nil).
    fn replace_child(&mut self, parent: Option<DefaultKey>, old: DefaultKey, new: Option<DefaultKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let n = self.node_mut(p);
                if n.left == Some(old) {
                    n.left = new;
                } else {
                    debug_assert_eq!(n.right, Some(old));
                    n.right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, x: DefaultKey) {
        let y = self.right(x).expect("rotate_left needs a right child");
        let y_left = self.left(y);
        self.node_mut(x).right = y_left;
        self.set_parent(y_left, Some(x));
        let xp = self.parent(x);
        self.node_mut(y).parent = xp;
        self.replace_child(xp, x, Some(y));
        self.node_mut(y).left = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    fn rotate_right(&mut self, x: DefaultKey) {
        let y = self.left(x).expect("rotate_right needs a left child");
        let y_right = self.right(y);
        self.node_mut(x).left = y_right;
        self.set_parent(y_right, Some(x));
        let xp = self.parent(x);
        self.node_mut(y).parent = xp;
        self.replace_child(xp, x, Some(y));
        self.node_mut(y).right = Some(x);
        self.node_mut(x).parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: DefaultKey) {
        while let Some(p) = self.parent(z).filter(|&p| self.is_red(Some(p))) {
            // A red node is never the root, so the grandparent exists.
            let g = self.parent(p).expect("red parent has a parent");
            if self.left(g) == Some(p) {
                let uncle = self.right(g);
                if self.is_red(uncle) {
                    self.set_color(Some(p), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(g), Color::Red);
                    z = g;
                    continue;
                }
                if self.right(p) == Some(z) {
                    z = p;
                    self.rotate_left(z);
                }
                let p = self.parent(z).expect("rotated node has a parent");
                let g = self.parent(p).expect("rotated parent has a parent");
                self.set_color(Some(p), Color::Black);
                self.set_color(Some(g), Color::Red);
                self.rotate_right(g);
            } else {
                let uncle = self.left(g);
                if self.is_red(uncle) {
                    self.set_color(Some(p), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(g), Color::Red);
                    z = g;
                    continue;
                }
                if self.left(p) == Some(z) {
                    z = p;
                    self.rotate_right(z);
                }
                let p = self.parent(z).expect("rotated node has a parent");
                let g = self.parent(p).expect("rotated parent has a parent");
                self.set_color(Some(p), Color::Black);
                self.set_color(Some(g), Color::Red);
                self.rotate_left(g);
            }
        }
        self.set_color(self.root, Color::Black);
    }

    /// Put subtree `v` where `u` hangs.
    fn transplant(&mut self, u: DefaultKey, v: Option<DefaultKey>) {
        let up = self.parent(u);
        self.replace_child(up, u, v);
        self.set_parent(v, up);
    }

    /// Unlink `z`, rebalance, and hand back its record.
    fn delete(&mut self, z: DefaultKey) -> T {
        let removed_color;
        let x;
        let x_parent;
        match (self.left(z), self.right(z)) {
            (None, child) | (child, None) => {
                removed_color = self.node(z).color;
                x = child;
                x_parent = self.parent(z);
                self.transplant(z, child);
            }
            (Some(zl), Some(zr)) => {
                let y = self.minimum(zr);
                removed_color = self.node(y).color;
                x = self.right(y);
                if self.parent(y) == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.parent(y);
                    self.transplant(y, x);
                    self.node_mut(y).right = Some(zr);
                    self.node_mut(zr).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(zl);
                self.node_mut(zl).parent = Some(y);
                let zc = self.node(z).color;
                self.node_mut(y).color = zc;
            }
        }
        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
        self.nodes.remove(z).expect("deleted node is live").record
    }

    /// Restore black height after removing a black node. `x` carries the
    /// extra black and may be nil, so its parent is tracked separately.
    fn delete_fixup(&mut self, mut x: Option<DefaultKey>, mut parent: Option<DefaultKey>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else {
                break;
            };
            if self.left(p) == x {
                let mut w = self.right(p).expect("doubly black node has a sibling");
                if self.is_red(Some(w)) {
                    self.set_color(Some(w), Color::Black);
                    self.set_color(Some(p), Color::Red);
                    self.rotate_left(p);
                    w = self.right(p).expect("sibling after rotation");
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(Some(w), Color::Red);
                    x = Some(p);
                    parent = self.parent(p);
                } else {
                    if !self.is_red(self.right(w)) {
                        self.set_color(self.left(w), Color::Black);
                        self.set_color(Some(w), Color::Red);
                        self.rotate_right(w);
                        w = self.right(p).expect("sibling after rotation");
                    }
                    let pc = self.node(p).color;
                    self.set_color(Some(w), pc);
                    self.set_color(Some(p), Color::Black);
                    self.set_color(self.right(w), Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let mut w = self.left(p).expect("doubly black node has a sibling");
                if self.is_red(Some(w)) {
                    self.set_color(Some(w), Color::Black);
                    self.set_color(Some(p), Color::Red);
                    self.rotate_right(p);
                    w = self.left(p).expect("sibling after rotation");
                }
                if !self.is_red(self.left(w)) && !self.is_red(self.right(w)) {
                    self.set_color(Some(w), Color::Red);
                    x = Some(p);
                    parent = self.parent(p);
                } else {
                    if !self.is_red(self.left(w)) {
                        self.set_color(self.right(w), Color::Black);
                        self.set_color(Some(w), Color::Red);
                        self.rotate_left(w);
                        w = self.left(p).expect("sibling after rotation");
                    }
                    let pc = self.node(p).color;
                    self.set_color(Some(w), pc);
                    self.set_color(Some(p), Color::Black);
                    self.set_color(self.left(w), Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }
        self.set_color(x, Color::Black);
    }
}

impl<T> RbTree<T> {
    pub(crate) const fn new() -> Self {
        Self {
            storage: Storage::Placeholder,
        }
    }

    #[inline]
    fn live(&self) -> Option<&Live<T>> {
        match &self.storage {
            Storage::Live(t) => Some(t),
            Storage::Placeholder => None,
        }
    }

    #[inline]
    fn live_mut(&mut self) -> Option<&mut Live<T>> {
        match &mut self.storage {
            Storage::Live(t) => Some(t),
            Storage::Placeholder => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.live().map_or(0, |t| t.nodes.len())
    }

    pub(crate) fn is_allocated(&self) -> bool {
        matches!(self.storage, Storage::Live(_))
    }

    pub(crate) fn capacity(&self) -> usize {
        self.live().map_or(0, |t| t.nodes.capacity())
    }

    pub(crate) fn get(&self, c: Cursor) -> Option<&T> {
        let t = self.live()?;
        let id = c.0?;
        t.nodes.get(id).map(|n| &n.record)
    }

    pub(crate) fn get_mut(&mut self, c: Cursor) -> Option<&mut T> {
        let t = self.live_mut()?;
        t.nodes.get_mut(c.0?).map(|n| &mut n.record)
    }

    /// Find the record `order` reports `Equal` for. `order(r)` orders the
    /// query against record `r`.
    pub(crate) fn find(&self, mut order: impl FnMut(&T) -> Ordering) -> Cursor {
        let Some(t) = self.live() else {
            return Cursor::END;
        };
        let mut cur = t.root;
        while let Some(id) = cur {
            cur = match order(&t.node(id).record) {
                Ordering::Less => t.left(id),
                Ordering::Greater => t.right(id),
                Ordering::Equal => return Cursor(Some(id)),
            };
        }
        Cursor::END
    }

    /// Smallest record for which `pred` holds. `pred` must be false on a
    /// prefix of the order and true on the rest.
    pub(crate) fn seek_first(&self, mut pred: impl FnMut(&T) -> bool) -> Cursor {
        let Some(t) = self.live() else {
            return Cursor::END;
        };
        let (mut cur, mut found) = (t.root, None);
        while let Some(id) = cur {
            if pred(&t.node(id).record) {
                found = Some(id);
                cur = t.left(id);
            } else {
                cur = t.right(id);
            }
        }
        Cursor(found)
    }

    /// Largest record for which `pred` holds. `pred` must be true on a
    /// prefix of the order and false on the rest.
    pub(crate) fn seek_last(&self, mut pred: impl FnMut(&T) -> bool) -> Cursor {
        let Some(t) = self.live() else {
            return Cursor::R_END;
        };
        let (mut cur, mut found) = (t.root, None);
        while let Some(id) = cur {
            if pred(&t.node(id).record) {
                found = Some(id);
                cur = t.right(id);
            } else {
                cur = t.left(id);
            }
        }
        Cursor(found)
    }

    /// Look up a record; if absent, reserve a node for it and return where
    /// it links in. Nothing is relinked until `fill`.
    pub(crate) fn find_or_reserve(
        &mut self,
        mut order: impl FnMut(&T) -> Ordering,
    ) -> Result<Lookup, TryReserveError> {
        let mut slot = VacantSlot {
            parent: None,
            left: false,
        };
        if let Some(t) = self.live() {
            let mut cur = t.root;
            while let Some(id) = cur {
                let ord = order(&t.node(id).record);
                if ord == Ordering::Equal {
                    return Ok(Lookup::Found(Cursor(Some(id))));
                }
                slot = VacantSlot {
                    parent: Some(id),
                    left: ord == Ordering::Less,
                };
                cur = if slot.left { t.left(id) } else { t.right(id) };
            }
        }
        self.reserve(self.len() + 1)?;
        Ok(Lookup::Vacant(slot))
    }

    /// Link `record` at a slot returned by `find_or_reserve` and rebalance.
    pub(crate) fn fill(&mut self, slot: VacantSlot, record: T) -> Cursor {
        let t = self
            .live_mut()
            .expect("vacant slot implies a live tree");
        let id = t.nodes.insert(Node {
            record,
            parent: slot.parent,
            left: None,
            right: None,
            color: Color::Red,
        });
        match slot.parent {
            None => {
                debug_assert!(t.root.is_none());
                t.root = Some(id);
            }
            Some(p) if slot.left => t.node_mut(p).left = Some(id),
            Some(p) => t.node_mut(p).right = Some(id),
        }
        t.insert_fixup(id);
        Cursor(Some(id))
    }

    pub(crate) fn replace(&mut self, c: Cursor, record: T) -> T {
        let slot = self
            .get_mut(c)
            .expect("replace requires a live cursor");
        core::mem::replace(slot, record)
    }

    /// Remove the record at `c`. Returns it with the cursor of its
    /// in-order successor, or `None` if `c` names no record.
    pub(crate) fn erase(&mut self, c: Cursor) -> Option<(T, Cursor)> {
        let t = self.live_mut()?;
        let id = c.0?;
        if !t.nodes.contains_key(id) {
            return None;
        }
        let next = t.successor(id);
        let record = t.delete(id);
        Some((record, Cursor(next)))
    }

    pub(crate) fn first(&self) -> Cursor {
        Cursor(self.live().and_then(|t| t.root.map(|r| t.minimum(r))))
    }

    pub(crate) fn last(&self) -> Cursor {
        Cursor(self.live().and_then(|t| t.root.map(|r| t.maximum(r))))
    }

    /// In-order successor; `END` after the last record or for a boundary.
    pub(crate) fn next(&self, c: Cursor) -> Cursor {
        match (self.live(), c.0) {
            (Some(t), Some(id)) if t.nodes.contains_key(id) => Cursor(t.successor(id)),
            _ => Cursor::END,
        }
    }

    /// In-order predecessor; `R_END` before the first record or for a boundary.
    pub(crate) fn prev(&self, c: Cursor) -> Cursor {
        match (self.live(), c.0) {
            (Some(t), Some(id)) if t.nodes.contains_key(id) => Cursor(t.predecessor(id)),
            _ => Cursor::R_END,
        }
    }

    /// Make sure `records` records fit without allocating.
    pub(crate) fn reserve(&mut self, records: usize) -> Result<(), TryReserveError> {
        let additional = records.saturating_sub(self.len());
        if additional == 0 {
            return Ok(());
        }
        if let Some(t) = self.live_mut() {
            let before = t.nodes.capacity();
            reserve_nodes(&mut t.nodes, additional)?;
            if t.nodes.capacity() != before {
                log::trace!("node slots grew from {} to {}", before, t.nodes.capacity());
            }
            return Ok(());
        }
        let mut t = Live::new();
        reserve_nodes(&mut t.nodes, additional)?;
        log::debug!("tree allocated room for {} nodes", t.nodes.capacity());
        self.storage = Storage::Live(t);
        Ok(())
    }

    /// An empty tree returns to the placeholder. A non-empty tree keeps its
    /// node slots: a vacated slot remembers its generation, which is what
    /// lets stale cursors read as `None`.
    pub(crate) fn shrink(&mut self) -> Result<(), TryReserveError> {
        if self.len() == 0 {
            self.cleanup();
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        if let Some(t) = self.live_mut() {
            t.nodes.clear();
            t.root = None;
        }
    }

    pub(crate) fn cleanup(&mut self) {
        if self.is_allocated() {
            log::debug!("tree returned to placeholder");
        }
        self.storage = Storage::Placeholder;
    }

    /// Copy node for node: same shape, colors and keys. Room for the copy is
    /// requested fallibly first; the copy itself then fits in that much.
    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError>
    where
        T: Clone,
    {
        let storage = match &self.storage {
            Storage::Live(t) if !t.nodes.is_empty() => {
                let mut room: SlotMap<DefaultKey, Node<T>> = SlotMap::new();
                reserve_nodes(&mut room, t.nodes.capacity())?;
                drop(room);
                Storage::Live(Live {
                    nodes: t.nodes.clone(),
                    root: t.root,
                })
            }
            _ => Storage::Placeholder,
        };
        Ok(Self { storage })
    }

    /// Walk records from `front` to `back` inclusive, in order. Both must be
    /// live cursors with `front` not after `back`, or both boundaries.
    pub(crate) fn iter_between(&self, front: Cursor, back: Cursor) -> RawIter<'_, T> {
        debug_assert_eq!(front.is_end(), back.is_end());
        RawIter {
            tree: self,
            front,
            back,
        }
    }

    pub(crate) fn iter(&self) -> RawIter<'_, T> {
        self.iter_between(self.first(), self.last())
    }

    /// Mutable in-order iteration. Positions are ranked up front, so this
    /// allocates one slot per record.
    pub(crate) fn iter_mut(&mut self) -> RawIterMut<'_, T> {
        let Some(t) = self.live_mut() else {
            return Vec::new().into_iter().flatten();
        };
        let mut rank = SecondaryMap::with_capacity(t.nodes.len());
        let mut cur = t.root.map(|r| t.minimum(r));
        let mut n = 0;
        while let Some(id) = cur {
            rank.insert(id, n);
            n += 1;
            cur = t.successor(id);
        }
        let mut ordered: Vec<Option<&mut T>> = Vec::with_capacity(n);
        ordered.resize_with(n, || None);
        for (id, node) in t.nodes.iter_mut() {
            ordered[rank[id]] = Some(&mut node.record);
        }
        ordered.into_iter().flatten()
    }

    /// Check every structural invariant; used by tests after each step.
    /// `cmp` must be the order the tree was built with.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self, mut cmp: impl FnMut(&T, &T) -> Ordering) {
        let Some(t) = self.live() else {
            return;
        };
        assert_eq!(t.color(t.root), Color::Black, "root must be black");
        if let Some(r) = t.root {
            assert_eq!(t.parent(r), None, "root has a parent");
        }

        fn black_height<T>(t: &Live<T>, x: Option<DefaultKey>, count: &mut usize) -> usize {
            let Some(id) = x else {
                return 1;
            };
            *count += 1;
            let n = t.node(id);
            for child in [n.left, n.right].into_iter().flatten() {
                assert_eq!(t.parent(child), Some(id), "broken parent link");
                if n.color == Color::Red {
                    assert_eq!(t.color(Some(child)), Color::Black, "red node with red child");
                }
            }
            let lh = black_height(t, n.left, count);
            let rh = black_height(t, n.right, count);
            assert_eq!(lh, rh, "unequal black height below node {:?}", id);
            lh + usize::from(n.color == Color::Black)
        }

        let mut count = 0;
        black_height(t, t.root, &mut count);
        assert_eq!(count, t.nodes.len(), "unreachable nodes in slot map");

        let mut prev: Option<&T> = None;
        for r in self.iter() {
            if let Some(p) = prev {
                assert_eq!(cmp(p, r), Ordering::Less, "in-order walk not strictly increasing");
            }
            prev = Some(r);
        }
    }
}

/// `SlotMap::try_reserve` reports std's error; restate it as ours.
fn reserve_nodes<T>(
    nodes: &mut SlotMap<DefaultKey, Node<T>>,
    additional: usize,
) -> Result<(), TryReserveError> {
    let wanted = nodes
        .len()
        .checked_add(additional)
        .ok_or(TryReserveError::CapacityOverflow)?;
    let layout =
        Layout::array::<Node<T>>(wanted).map_err(|_| TryReserveError::CapacityOverflow)?;
    nodes
        .try_reserve(additional)
        .map_err(|_| TryReserveError::AllocError { layout })
}

pub(crate) type RawIterMut<'a, T> = core::iter::Flatten<std::vec::IntoIter<Option<&'a mut T>>>;

/// Double-ended walk over an inclusive cursor range.
pub(crate) struct RawIter<'a, T> {
    tree: &'a RbTree<T>,
    front: Cursor,
    back: Cursor,
}

impl<T> Clone for RawIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T> Iterator for RawIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let record = self.tree.get(self.front)?;
        if self.front == self.back {
            self.front = Cursor::END;
            self.back = Cursor::R_END;
        } else {
            self.front = self.tree.next(self.front);
        }
        Some(record)
    }
}

impl<'a, T> DoubleEndedIterator for RawIter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        let record = self.tree.get(self.back)?;
        if self.front == self.back {
            self.front = Cursor::END;
            self.back = Cursor::R_END;
        } else {
            self.back = self.tree.prev(self.back);
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(t: &mut RbTree<u32>, k: u32) -> (Cursor, bool) {
        match t.find_or_reserve(|r| k.cmp(r)).unwrap() {
            Lookup::Found(c) => (c, false),
            Lookup::Vacant(slot) => (t.fill(slot, k), true),
        }
    }

    fn keys(t: &RbTree<u32>) -> Vec<u32> {
        t.iter().copied().collect()
    }

    #[test]
    fn placeholder_reads_as_empty() {
        let t: RbTree<u32> = RbTree::new();
        assert!(!t.is_allocated());
        assert_eq!(t.len(), 0);
        assert_eq!(t.first(), Cursor::END);
        assert_eq!(t.last(), Cursor::R_END);
        assert_eq!(t.find(|r: &u32| 1.cmp(r)), Cursor::END);
        assert_eq!(t.iter().count(), 0);
        assert_eq!(t.seek_first(|_| true), Cursor::END);
    }

    /// Invariant: ascending inserts (the rotation-heavy case) stay balanced.
    #[test]
    fn ascending_inserts_balance() {
        let mut t = RbTree::new();
        for k in 0..512 {
            assert!(insert(&mut t, k).1);
            t.check_invariants(u32::cmp);
        }
        assert_eq!(keys(&t), (0..512).collect::<Vec<_>>());
        assert_eq!(t.iter().rev().copied().collect::<Vec<_>>(), (0..512).rev().collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_insert_finds_existing() {
        let mut t = RbTree::new();
        let (c, _) = insert(&mut t, 7);
        let (c2, inserted) = insert(&mut t, 7);
        assert!(!inserted);
        assert_eq!(c, c2);
        assert_eq!(t.len(), 1);
    }

    /// Invariant: erase keeps balance and survivors keep their cursors.
    #[test]
    fn erase_keeps_other_cursors() {
        let mut t = RbTree::new();
        let cursors: Vec<(u32, Cursor)> = (0..200).map(|k| (k, insert(&mut t, k).0)).collect();
        for &(k, c) in cursors.iter().filter(|(k, _)| k % 3 == 0) {
            let (removed, next) = t.erase(c).unwrap();
            assert_eq!(removed, k);
            assert_eq!(t.get(next).copied(), (k + 1 < 200).then_some(k + 1));
            t.check_invariants(u32::cmp);
        }
        for &(k, c) in cursors.iter().filter(|(k, _)| k % 3 != 0) {
            assert_eq!(t.get(c), Some(&k), "cursor for {k} moved");
        }
    }

    #[test]
    fn erase_all_through_successors() {
        let mut t = RbTree::new();
        for k in [50, 20, 80, 10, 30, 70, 90, 25, 35, 5] {
            insert(&mut t, k);
        }
        let mut c = t.first();
        let mut seen = Vec::new();
        while !c.is_end() {
            seen.push(*t.get(c).unwrap());
            c = t.erase(c).unwrap().1;
            t.check_invariants(u32::cmp);
        }
        assert_eq!(seen, vec![5, 10, 20, 25, 30, 35, 50, 70, 80, 90]);
        assert_eq!(t.len(), 0);
        assert!(t.is_allocated());
        t.shrink().unwrap();
        assert!(!t.is_allocated());
    }

    #[test]
    fn seeks_find_bounds() {
        let mut t = RbTree::new();
        for k in (0..100).step_by(10) {
            insert(&mut t, k);
        }
        let at_or_after = |t: &RbTree<u32>, q: u32| t.get(t.seek_first(|r| *r >= q)).copied();
        let at_or_before = |t: &RbTree<u32>, q: u32| t.get(t.seek_last(|r| *r <= q)).copied();
        assert_eq!(at_or_after(&t, 25), Some(30));
        assert_eq!(at_or_after(&t, 30), Some(30));
        assert_eq!(at_or_after(&t, 91), None);
        assert_eq!(at_or_before(&t, 25), Some(20));
        assert_eq!(at_or_before(&t, 0), Some(0));
        assert_eq!(t.seek_last(|_| false), Cursor::R_END);
    }

    #[test]
    fn iter_between_stops_at_back() {
        let mut t = RbTree::new();
        for k in 0..10 {
            insert(&mut t, k);
        }
        let front = t.seek_first(|r| *r >= 3);
        let back = t.seek_last(|r| *r <= 6);
        let fwd: Vec<u32> = t.iter_between(front, back).copied().collect();
        assert_eq!(fwd, vec![3, 4, 5, 6]);
        let mut it = t.iter_between(front, back);
        assert_eq!(it.next(), Some(&3));
        assert_eq!(it.next_back(), Some(&6));
        assert_eq!(it.next_back(), Some(&5));
        assert_eq!(it.next(), Some(&4));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn iter_mut_visits_in_order() {
        let mut t = RbTree::new();
        for k in [5u32, 1, 4, 2, 3] {
            insert(&mut t, k);
        }
        let mut order = Vec::new();
        for r in t.iter_mut() {
            order.push(*r);
        }
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn clone_is_node_for_node() {
        let mut t = RbTree::new();
        for k in 0..64 {
            insert(&mut t, k);
        }
        let c = t.find(|r: &u32| 40.cmp(r));
        let copy = t.try_clone().unwrap();
        assert_eq!(copy.get(c), Some(&40), "keys carry over to the copy");
        copy.check_invariants(u32::cmp);
        t.erase(c).unwrap();
        assert_eq!(copy.len(), 64);
        assert_eq!(t.len(), 63);
    }

    /// A cursor to an erased record must not reach the record that later
    /// takes over its slot.
    #[test]
    fn stale_cursor_misses_reused_slot() {
        let mut t = RbTree::new();
        let (stale, _) = insert(&mut t, 1);
        insert(&mut t, 2);
        assert_eq!(t.erase(stale).map(|(k, _)| k), Some(1));
        let (nine, inserted) = insert(&mut t, 9);
        assert!(inserted);
        assert_ne!(stale, nine);
        assert_eq!(t.get(stale), None);
        assert_eq!(t.get_mut(stale), None);
        assert_eq!(t.next(stale), Cursor::END);
        assert_eq!(t.prev(stale), Cursor::R_END);
        assert!(t.erase(stale).is_none());
        assert_eq!(keys(&t), vec![2, 9]);
        t.check_invariants(u32::cmp);
    }

    #[test]
    fn clear_retires_cursors() {
        let mut t = RbTree::new();
        let (c, _) = insert(&mut t, 4);
        t.clear();
        insert(&mut t, 4);
        assert_eq!(t.get(c), None);
    }

    #[test]
    fn reserve_covers_later_inserts() {
        let mut t = RbTree::new();
        t.reserve(100).unwrap();
        let cap = t.capacity();
        assert!(cap >= 100);
        for k in 0..100 {
            insert(&mut t, k);
        }
        assert_eq!(t.capacity(), cap);
    }
}
