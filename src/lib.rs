//! retained-map: a fixed-capacity, single-threaded hash map that retains
//! buckets across removals, with coexisting mutable and read-only views.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: optimal behavior for pooled key sets that recur across many
//!   use cycles (per-connection attribute maps and the like). Once a key
//!   has claimed a bucket, removing its value does not delete the bucket:
//!   lookup cost and entry identity stay stable across clear/reuse cycles
//!   and no allocation churn occurs on reinsertion.
//! - Layers:
//!   - RetainedMap<K, V, S>: the storage core and the mutable view in one.
//!     A fixed power-of-two array of chain heads (bit-mask indexing, no
//!     rehashing ever) over a slotmap arena of buckets; each bucket caches
//!     its hash and holds `Option<V>`, where `None` means "no value" while
//!     the bucket itself persists.
//!   - EntryRef / ReadOnlyEntryRef: copyable handles bound to one bucket
//!     for the life of the map. Accessors take the map explicitly, so the
//!     mutable handle writes only when the caller holds `&mut` and the
//!     read-only handle can never write at all.
//!   - ReadOnlyView<'_, K, V, S>: the façade handed to non-owning callers.
//!     Values that are themselves retained maps project to *their*
//!     read-only view on read, so nested structures are read-only at every
//!     depth.
//!   - Entries / EntriesMut: both specialize one chain-walking cursor that
//!     surfaces only present-valued buckets, in bucket-index order.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design; callers needing sharing
//!   supply their own synchronization around the whole map.
//! - Fixed capacity: chains grow unboundedly past the design capacity;
//!   size the map for its workload.
//! - Change hook: an injected [`ChangeHook`] is consulted exactly once
//!   before each logical mutation and may reject it, leaving the map
//!   untouched. Whole-map operations notify with `None` in place of a key.
//!
//! Hasher invariants
//! - Each bucket stores its `u64` hash at insertion; probing compares the
//!   cached hash before key equality and `K: Hash` is never re-invoked for
//!   stored keys.
//!
//! Notes and non-goals
//! - No resizing, no rehashing, no deletion compaction. The only path that
//!   ever frees a bucket is the chain-truncation valve in
//!   [`RetainedMap::clear`], which treats an impossibly long chain as
//!   corruption.
//! - Iteration order is bucket-index order, not insertion order.
//! - Public surface: [`RetainedMap`], the handle pair, [`ReadOnlyView`],
//!   the cursors, [`ChangeHook`], and [`MapError`].

mod cursor;
mod entry;
mod error;
mod guard;
mod hook;
mod map;
mod map_proptest;
mod view;

// Public surface
pub use cursor::{Entries, EntriesMut};
pub use entry::{EntryRef, ReadOnlyEntryRef};
pub use error::MapError;
pub use hook::{ChangeHook, RejectedChange};
pub use map::RetainedMap;
pub use view::ReadOnlyView;
