//! RetainedMap: fixed-capacity chained hash table with retained buckets.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use slotmap::{new_key_type, SlotMap};
use std::collections::hash_map::RandomState;

use crate::cursor::{Entries, EntriesMut};
use crate::entry::EntryRef;
use crate::error::MapError;
use crate::guard::ProbeGuard;
use crate::hook::ChangeHook;
use crate::view::ReadOnlyView;

new_key_type! {
    /// Arena key identifying one bucket; the identity carried by entry handles.
    pub(crate) struct BucketId;
}

/// Nominal capacity used by [`RetainedMap::new`].
const DEFAULT_NOMINAL_CAPACITY: usize = 8;

/// One key's slot in a chain. Created on the first insert of its key and
/// reused in place across remove/reinsert cycles; never destroyed except by
/// the chain-truncation path of [`RetainedMap::clear`].
#[derive(Debug)]
pub(crate) struct Bucket<K, V> {
    pub(crate) key: K,
    pub(crate) hash: u64,
    pub(crate) value: Option<V>,
    pub(crate) next: Option<BucketId>,
}

/// A fixed-capacity hash map that retains buckets across removals.
///
/// Capacity is rounded up to a power of two at construction and never
/// changes; there is no rehashing. Removing a value leaves its bucket (and
/// any [`EntryRef`] bound to it) in place, so a pooled key set reused across
/// many cycles keeps stable lookup cost and stable entry identity. The cost
/// of that trade is that chains grow without bound under key churn beyond
/// the design capacity.
///
/// The map itself is the mutable view; [`RetainedMap::as_read_only`] hands
/// out the read-only façade. Single-threaded: the type is `!Send + !Sync`.
pub struct RetainedMap<K, V, S = RandomState> {
    hasher: S,
    heads: Box<[Option<BucketId>]>,
    buckets: SlotMap<BucketId, Bucket<K, V>>,
    mask: u64,
    len: usize,
    hook: Option<Box<dyn ChangeHook<K>>>,
    guard: ProbeGuard,
}

impl<K, V> RetainedMap<K, V>
where
    K: Eq + Hash,
{
    /// Map with the default nominal capacity of 8.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NOMINAL_CAPACITY)
    }

    /// Map sized to the next power of two at or above `nominal`.
    pub fn with_capacity(nominal: usize) -> Self {
        Self::with_capacity_and_hasher(nominal, RandomState::new())
    }
}

impl<K, V> Default for RetainedMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RetainedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(nominal: usize, hasher: S) -> Self {
        let capacity = nominal.next_power_of_two().max(1);
        Self {
            hasher,
            heads: vec![None; capacity].into_boxed_slice(),
            buckets: SlotMap::with_key(),
            mask: (capacity - 1) as u64,
            len: 0,
            hook: None,
            guard: ProbeGuard::new(),
        }
    }

    /// Install a change hook, replacing any previous one.
    ///
    /// The hook is consulted once per logical mutation from then on; see
    /// [`ChangeHook`].
    pub fn with_hook(mut self, hook: impl ChangeHook<K> + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Locate the bucket for `key`, present-valued or not.
    ///
    /// Compares the cached hash first, then key equality; O(chain length).
    pub(crate) fn find_bucket<Q>(&self, key: &Q) -> Option<BucketId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _scope = self.guard.enter();
        let hash = self.make_hash(key);
        let mut cursor = self.heads[self.slot_of(hash)];
        while let Some(id) = cursor {
            let Some(bucket) = self.buckets.get(id) else {
                break;
            };
            if bucket.hash == hash && bucket.key.borrow() == key {
                return Some(id);
            }
            cursor = bucket.next;
        }
        None
    }

    /// Value for `key`, if one is currently present.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find_bucket(key)?;
        self.buckets.get(id)?.value.as_ref()
    }

    /// Mutable access to the value for `key`.
    ///
    /// Notifies the hook before exposing the reference, since the caller may
    /// mutate through it; a rejecting hook therefore also embargoes mutable
    /// access. Absent values yield `Ok(None)` without notification.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<Option<&mut V>, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(id) = self.find_bucket(key) else {
            return Ok(None);
        };
        self.expose_value_mut(id)
    }

    /// True when a present value exists for `key`. Absent-valued buckets are
    /// invisible here; use [`RetainedMap::entry`] to observe bucket retention.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Stable handle for `key`'s bucket, whether or not a value is present.
    ///
    /// The handle stays bound to the same bucket for the life of the map,
    /// across removals, reinsertion, and `clear`.
    pub fn entry<Q>(&self, key: &Q) -> Option<EntryRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_bucket(key).map(EntryRef::new)
    }

    /// Insert or update, returning the previous present value.
    ///
    /// An existing bucket for `key` is updated in place, preserving its
    /// identity; otherwise a new bucket is appended at the tail of its
    /// chain. The hook is notified once, before any probing.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        if let Some(hook) = &mut self.hook {
            hook.before_change(Some(&key)).map_err(|_| MapError::Rejected)?;
        }

        let hash;
        let slot;
        let mut tail = None;
        let mut found = None;
        {
            let _scope = self.guard.enter();
            hash = self.make_hash(&key);
            slot = self.slot_of(hash);
            let mut cursor = self.heads[slot];
            while let Some(id) = cursor {
                let Some(bucket) = self.buckets.get(id) else {
                    break;
                };
                if bucket.hash == hash && bucket.key == key {
                    found = Some(id);
                    break;
                }
                tail = Some(id);
                cursor = bucket.next;
            }
        }

        if let Some(id) = found {
            return Ok(self.write_value(id, Some(value)));
        }

        let id = self.buckets.insert(Bucket {
            key,
            hash,
            value: Some(value),
            next: None,
        });
        self.len += 1;
        match tail {
            Some(t) => {
                if let Some(bucket) = self.buckets.get_mut(t) {
                    bucket.next = Some(id);
                }
            }
            None => self.heads[slot] = Some(id),
        }
        Ok(None)
    }

    /// Remove the value for `key`, returning it.
    ///
    /// The bucket is never unlinked: removal is "set value to absent", so a
    /// later insert of the same key reuses the bucket and its handles. The
    /// hook is notified with the stored key when the bucket exists; a remove
    /// that finds no bucket mutates nothing and does not notify.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.find_bucket(key) {
            Some(id) => self.set_value(id, None),
            None => Ok(None),
        }
    }

    /// Set every value to absent, keeping all buckets and handles intact.
    ///
    /// The hook is notified once, with `None`, for the whole operation.
    ///
    /// Chain-truncation valve: a chain whose walked depth exceeds the
    /// capacity is assumed corrupt; the remainder is unlinked and freed.
    /// With chains shorter than the capacity (any correctly sized workload)
    /// this path is unreachable.
    pub fn clear(&mut self) -> Result<(), MapError> {
        if let Some(hook) = &mut self.hook {
            hook.before_change(None).map_err(|_| MapError::Rejected)?;
        }

        let capacity = self.heads.len();
        for slot in 0..capacity {
            let mut depth = 0;
            let mut cursor = self.heads[slot];
            while let Some(id) = cursor {
                let Some(bucket) = self.buckets.get_mut(id) else {
                    break;
                };
                bucket.value = None;
                depth += 1;
                if depth > capacity {
                    cursor = bucket.next.take();
                    while let Some(orphan) = cursor {
                        cursor = self.buckets.remove(orphan).and_then(|b| b.next);
                    }
                    break;
                }
                cursor = bucket.next;
            }
        }
        self.len = 0;
        Ok(())
    }

    /// Read-only iterator over present entries, in bucket-index order.
    pub fn entries(&self) -> Entries<'_, K, V, S> {
        Entries::new(self)
    }

    /// Mutable entry cursor supporting per-entry value writes and removal.
    pub fn entries_mut(&mut self) -> EntriesMut<'_, K, V, S> {
        EntriesMut::new(self)
    }
}

// Hook-independent surface and internal plumbing shared with the handle,
// view, and cursor modules.
impl<K, V, S> RetainedMap<K, V, S> {
    #[inline]
    fn slot_of(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    /// Count of keys with a present value (not of retained buckets).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed slot count; a power of two, set at construction.
    pub fn capacity(&self) -> usize {
        self.heads.len()
    }

    /// The read-only façade over this map.
    pub fn as_read_only(&self) -> ReadOnlyView<'_, K, V, S> {
        ReadOnlyView::new(self)
    }

    pub(crate) fn bucket(&self, id: BucketId) -> Option<&Bucket<K, V>> {
        self.buckets.get(id)
    }

    pub(crate) fn head(&self, slot: usize) -> Option<BucketId> {
        self.heads[slot]
    }

    pub(crate) fn bucket_key(&self, id: BucketId) -> Option<&K> {
        self.buckets.get(id).map(|b| &b.key)
    }

    pub(crate) fn bucket_value(&self, id: BucketId) -> Option<&V> {
        self.buckets.get(id).and_then(|b| b.value.as_ref())
    }

    /// Write a value without consulting the hook, adjusting `len` for the
    /// absent/present transition. Callers have already notified.
    fn write_value(&mut self, id: BucketId, value: Option<V>) -> Option<V> {
        let Some(bucket) = self.buckets.get_mut(id) else {
            return None;
        };
        let old = mem::replace(&mut bucket.value, value);
        match (old.is_some(), bucket.value.is_some()) {
            (true, false) => self.len -= 1,
            (false, true) => self.len += 1,
            _ => {}
        }
        old
    }

    /// The handle write path: hook, then value and `len` in one step.
    pub(crate) fn set_value(&mut self, id: BucketId, value: Option<V>) -> Result<Option<V>, MapError> {
        let Self {
            buckets, hook, len, ..
        } = self;
        let bucket = buckets.get_mut(id).ok_or(MapError::InvalidEntry)?;
        if let Some(hook) = hook {
            hook.before_change(Some(&bucket.key))
                .map_err(|_| MapError::Rejected)?;
        }
        let old = mem::replace(&mut bucket.value, value);
        match (old.is_some(), bucket.value.is_some()) {
            (true, false) => *len -= 1,
            (false, true) => *len += 1,
            _ => {}
        }
        Ok(old)
    }

    /// The handle mutable-read path: hook, then `&mut V` for a present value.
    pub(crate) fn expose_value_mut(&mut self, id: BucketId) -> Result<Option<&mut V>, MapError> {
        let Self { buckets, hook, .. } = self;
        let bucket = buckets.get_mut(id).ok_or(MapError::InvalidEntry)?;
        if bucket.value.is_none() {
            return Ok(None);
        }
        if let Some(hook) = hook {
            hook.before_change(Some(&bucket.key))
                .map_err(|_| MapError::Rejected)?;
        }
        Ok(bucket.value.as_mut())
    }

    /// Test-only structural audit: `len` accounting, chain link integrity,
    /// and the absence of orphaned buckets in the arena.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let present = self.buckets.values().filter(|b| b.value.is_some()).count();
        assert_eq!(self.len, present, "len must equal present-valued buckets");

        let mut reached = 0;
        for slot in 0..self.heads.len() {
            let mut cursor = self.heads[slot];
            let mut depth = 0;
            while let Some(id) = cursor {
                let bucket = self.buckets.get(id).expect("chain link must resolve");
                assert_eq!(
                    self.slot_of(bucket.hash),
                    slot,
                    "bucket must live in its hash slot"
                );
                reached += 1;
                depth += 1;
                assert!(depth <= self.buckets.len(), "chain must be acyclic");
                cursor = bucket.next;
            }
        }
        assert_eq!(
            reached,
            self.buckets.len(),
            "every bucket must be reachable from exactly one head"
        );
    }
}
