//! Read-only façade over a shared borrow of the map.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::cursor::Entries;
use crate::entry::ReadOnlyEntryRef;
use crate::map::RetainedMap;

/// The read-only view of a [`RetainedMap`].
///
/// A copyable wrapper over a shared borrow: it exposes the full read surface
/// and, by construction, no mutation, since every mutating operation on the
/// map requires `&mut`, which cannot be reached through this view. Hand it to
/// non-owning callers; the runtime not-permitted contract for handles and
/// cursors obtained here is carried by [`ReadOnlyEntryRef::set`] and
/// [`Entries::remove_current`].
pub struct ReadOnlyView<'a, K, V, S = RandomState> {
    map: &'a RetainedMap<K, V, S>,
}

impl<'a, K, V, S> Clone for ReadOnlyView<'a, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, S> Copy for ReadOnlyView<'a, K, V, S> {}

impl<'a, K, V, S> ReadOnlyView<'a, K, V, S> {
    pub(crate) fn new(map: &'a RetainedMap<K, V, S>) -> Self {
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Read-only iterator over present entries, in bucket-index order.
    pub fn entries(&self) -> Entries<'a, K, V, S> {
        Entries::new(self.map)
    }
}

impl<'a, K, V, S> ReadOnlyView<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Value for `key`, if one is currently present.
    pub fn get<Q>(&self, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key)
    }

    /// True when a present value exists for `key`; absent-valued buckets
    /// are invisible, exactly as through the owner.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    /// Read-only handle for `key`'s bucket, present-valued or not.
    pub fn entry<Q>(&self, key: &Q) -> Option<ReadOnlyEntryRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.entry(key).map(|h| h.read_only())
    }
}

// Nested retained maps project to their own read-only view on read, so a
// structure of maps-of-maps is read-only all the way down without the
// caller tracking the nesting depth.
impl<'a, K, K2, V2, S, S2> ReadOnlyView<'a, K, RetainedMap<K2, V2, S2>, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn get_view<Q>(&self, key: &Q) -> Option<ReadOnlyView<'a, K2, V2, S2>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).map(RetainedMap::as_read_only)
    }
}
