//! assoc-containers: open-addressing hash maps/sets and red-black ordered
//! maps/sets with stable cursors, erase-while-iterating, and fallible
//! allocation.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: two associative engines, each wrapped by a thin typed map and
//!   set, sharing one set of conventions (placeholder empty state, stable
//!   boundary cursors, pluggable hash/order, heterogeneous lookup).
//! - Layers:
//!   - `RawTable<T>`: hash engine. Power-of-two home buckets plus an
//!     overflow tail, one metadata byte per bucket, linear probing,
//!     backward-shift deletion. Stores any record `T` with its cached hash.
//!   - `HashMap<K, V, S>` / `HashSet<K, S>`: bind a `BuildHasher` and a
//!     `MaxLoad` to the engine; records are `(K, V)` or `K`.
//!   - `RbTree<T>`: tree engine. Red-black tree over a `SlotMap` of nodes,
//!     nil represented as `None`.
//!   - `TreeMap<K, V, C>` / `TreeSet<K, C>`: bind a `Comparator` to the
//!     engine.
//!
//! Constraints
//! - Single-threaded; containers are `Send` when their contents are, never
//!   `Sync`.
//! - An empty container that was never grown owns no allocation. `cleanup`
//!   and shrink-to-empty return it to that state.
//! - `END`/`R_END` cursors are constants, equal for every container of a
//!   kind in every state.
//! - Every allocating operation returns `Result<_, TryReserveError>` and
//!   leaves the container untouched on failure. `Clone`, `Extend` and
//!   `FromIterator` are the infallible conveniences on top.
//!
//! Hasher and rehashing invariants
//! - Each hash record stores a precomputed `u64` hash; growth and
//!   backward shift use the stored hash, so `K: Hash` runs only on the way
//!   in. Lookups compare the 7-bit tag, then the full hash, then the key.
//! - Probing never wraps. A run that reaches the last bucket grows the
//!   overflow tail instead, so backward shift only moves records toward
//!   lower indices. `erase_itr` relies on this: the continuation is the
//!   erased bucket itself when a later record shifted into it, otherwise
//!   the next occupied bucket.
//! - Growth plans the new layout on metadata alone, allocates every buffer
//!   it needs, then moves records. A failed allocation leaves the old
//!   table in place.
//!
//! Tree invariants
//! - Root black, no red node with a red child, equal black height on every
//!   root-to-nil path, nil black.
//! - Erase relinks nodes rather than swapping records, so a tree cursor
//!   stays valid until its own record is erased.
//! - New nodes are reserved in the pool before the tree is touched; fixup
//!   and rotations never allocate.
//!
//! Reentrancy policy
//! - Every container embeds a debug-only guard entered by each operation
//!   that runs user code (`Hash`, `Eq`, comparators, `Clone`). Re-entering
//!   the same container from that code panics in debug builds. Records
//!   removed or displaced by an operation are dropped after the guard is
//!   released and the structure is consistent again, so `Drop` may
//!   re-enter safely.
//!
//! Notes and non-goals
//! - Cursors are positions, not borrows: using one after the record it
//!   names is gone is a caller bug. Accessors return `None` for cursors
//!   that name nothing.
//! - Hash iteration order is bucket order and changes on growth.
//! - No persistence, no internal locking.

mod compare;
mod config;
mod error;
mod group;
pub mod hash_map;
pub mod hash_set;
mod raw_table;
mod raw_table_proptest;
mod rb_tree;
mod rb_tree_proptest;
mod reentrancy;
pub mod tree_map;
pub mod tree_set;

// Public surface
pub use compare::{Comparator, Natural, Reversed};
pub use config::MaxLoad;
pub use error::{ConfigError, TryReserveError};
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use tree_map::TreeMap;
pub use tree_set::TreeSet;
