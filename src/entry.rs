//! Stable entry handles bound to one bucket, in mutable and read-only form.

use crate::error::MapError;
use crate::map::{BucketId, RetainedMap};
use crate::view::ReadOnlyView;

/// Mutable handle to one bucket of a [`RetainedMap`].
///
/// The handle carries identity, not a borrow: accessors take the owning map
/// explicitly, so a handle can be stored for the life of the map and used
/// whenever the map is at hand. A key's handle never changes, not even
/// across value removal, reinsertion, or `clear`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryRef(BucketId);

impl EntryRef {
    pub(crate) fn new(id: BucketId) -> Self {
        EntryRef(id)
    }

    /// The bucket's key. `None` only for a dead handle.
    pub fn key<'a, K, V, S>(&self, map: &'a RetainedMap<K, V, S>) -> Option<&'a K> {
        map.bucket_key(self.0)
    }

    /// The current value; `None` when absent (or the handle is dead).
    pub fn get<'a, K, V, S>(&self, map: &'a RetainedMap<K, V, S>) -> Option<&'a V> {
        map.bucket_value(self.0)
    }

    /// Mutable access to a present value, notifying the hook first.
    pub fn get_mut<'a, K, V, S>(
        &self,
        map: &'a mut RetainedMap<K, V, S>,
    ) -> Result<Option<&'a mut V>, MapError> {
        map.expose_value_mut(self.0)
    }

    /// Write the value, returning the previous one.
    ///
    /// `Some(v)` stores a value, `None` removes it; this is the only removal
    /// mechanism at the handle level, and it leaves the bucket (and this
    /// handle) intact. The hook is notified with the bucket's key before the
    /// write; `len` moves by +1, -1, or 0 with the absent/present transition.
    pub fn set<K, V, S>(
        &self,
        map: &mut RetainedMap<K, V, S>,
        value: Option<V>,
    ) -> Result<Option<V>, MapError> {
        map.set_value(self.0, value)
    }

    /// The read-only handle for the same bucket.
    pub fn read_only(self) -> ReadOnlyEntryRef {
        ReadOnlyEntryRef(self.0)
    }
}

/// Read-only handle to one bucket of a [`RetainedMap`].
///
/// Shares the bucket identity of its mutable sibling but can only read;
/// [`ReadOnlyEntryRef::set`] fails unconditionally.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReadOnlyEntryRef(BucketId);

impl ReadOnlyEntryRef {
    pub(crate) fn new(id: BucketId) -> Self {
        ReadOnlyEntryRef(id)
    }

    pub fn key<'a, K, V, S>(&self, map: &'a RetainedMap<K, V, S>) -> Option<&'a K> {
        map.bucket_key(self.0)
    }

    pub fn get<'a, K, V, S>(&self, map: &'a RetainedMap<K, V, S>) -> Option<&'a V> {
        map.bucket_value(self.0)
    }

    /// Always `Err(MapError::NotPermitted)`; the map is untouched.
    pub fn set<K, V, S>(
        &self,
        _map: &RetainedMap<K, V, S>,
        _value: Option<V>,
    ) -> Result<Option<V>, MapError> {
        Err(MapError::NotPermitted)
    }
}

// Values that are themselves retained maps project to their read-only view,
// so nested structures stay read-only at every depth.
impl ReadOnlyEntryRef {
    pub fn get_view<'a, K, K2, V2, S, S2>(
        &self,
        map: &'a RetainedMap<K, RetainedMap<K2, V2, S2>, S>,
    ) -> Option<ReadOnlyView<'a, K2, V2, S2>> {
        map.bucket_value(self.0).map(RetainedMap::as_read_only)
    }
}
