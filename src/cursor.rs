//! Chain-order cursors over present entries.
//!
//! Both iterator flavors specialize one crate-private `ChainWalker`, which
//! walks every chain in head-index order and never surfaces a bucket whose
//! value is absent. The walker tolerates buckets vanishing underneath it
//! (possible only after the truncation valve): a dangling link reads as the
//! end of its chain, so interleaved mutation yields stale or skipped
//! entries, never a crash.

use std::collections::hash_map::RandomState;

use crate::entry::{EntryRef, ReadOnlyEntryRef};
use crate::error::MapError;
use crate::map::{BucketId, RetainedMap};

/// Shared cursor state: the next head slot to scan, the bucket to surface
/// next, and the last bucket handed out (for removal support).
pub(crate) struct ChainWalker {
    index: usize,
    current: Option<BucketId>,
    last: Option<BucketId>,
}

impl ChainWalker {
    /// A walker settled on the first present-valued bucket, if any.
    pub(crate) fn new<K, V, S>(map: &RetainedMap<K, V, S>) -> Self {
        let mut walker = Self {
            index: 0,
            current: None,
            last: None,
        };
        walker.settle(map);
        walker
    }

    /// Move `current` forward until it rests on a present-valued bucket or
    /// every chain is exhausted.
    fn settle<K, V, S>(&mut self, map: &RetainedMap<K, V, S>) {
        loop {
            while let Some(id) = self.current {
                match map.bucket(id) {
                    Some(bucket) if bucket.value.is_some() => return,
                    Some(bucket) => self.current = bucket.next,
                    None => self.current = None,
                }
            }
            if self.index >= map.capacity() {
                return;
            }
            self.current = map.head(self.index);
            self.index += 1;
        }
    }

    /// Surface the current bucket and settle on the next present one.
    pub(crate) fn advance<K, V, S>(&mut self, map: &RetainedMap<K, V, S>) -> Option<BucketId> {
        let id = self.current?;
        self.current = map.bucket(id).and_then(|bucket| bucket.next);
        self.settle(map);
        self.last = Some(id);
        Some(id)
    }

    pub(crate) fn last(&self) -> Option<BucketId> {
        self.last
    }

    pub(crate) fn clear_last(&mut self) {
        self.last = None;
    }
}

/// Read-only iterator over present entries, in bucket-index order.
///
/// Yields the read-only handle alongside borrowed key and value.
pub struct Entries<'a, K, V, S = RandomState> {
    map: &'a RetainedMap<K, V, S>,
    walker: ChainWalker,
}

impl<'a, K, V, S> Entries<'a, K, V, S> {
    pub(crate) fn new(map: &'a RetainedMap<K, V, S>) -> Self {
        let walker = ChainWalker::new(map);
        Self { map, walker }
    }

    /// Always `Err(MapError::NotPermitted)`: removal belongs to the mutable
    /// cursor, [`EntriesMut::remove_current`].
    pub fn remove_current(&mut self) -> Result<Option<V>, MapError> {
        Err(MapError::NotPermitted)
    }
}

impl<'a, K, V, S> Iterator for Entries<'a, K, V, S> {
    type Item = (ReadOnlyEntryRef, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.walker.advance(self.map)?;
        let bucket = self.map.bucket(id)?;
        let value = bucket.value.as_ref()?;
        Some((ReadOnlyEntryRef::new(id), &bucket.key, value))
    }
}

/// Mutable entry cursor: iteration plus per-entry writes and removal.
///
/// `next` hands out shared references; value writes go through
/// [`EntriesMut::set_current`] and [`EntriesMut::remove_current`] so that
/// every mutation passes the change hook exactly once.
pub struct EntriesMut<'a, K, V, S = RandomState> {
    map: &'a mut RetainedMap<K, V, S>,
    walker: ChainWalker,
}

impl<'a, K, V, S> EntriesMut<'a, K, V, S> {
    pub(crate) fn new(map: &'a mut RetainedMap<K, V, S>) -> Self {
        let walker = ChainWalker::new(map);
        Self { map, walker }
    }

    /// The next present entry, or `None` when every chain is exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<(EntryRef, &K, &V)> {
        let id = self.walker.advance(self.map)?;
        let bucket = self.map.bucket(id)?;
        let value = bucket.value.as_ref()?;
        Some((EntryRef::new(id), &bucket.key, value))
    }

    /// Write the value of the entry last returned by `next`, keeping the
    /// cursor position. `None` removes the value; the hook is notified with
    /// the entry's key first.
    pub fn set_current(&mut self, value: Option<V>) -> Result<Option<V>, MapError> {
        let id = self.walker.last().ok_or(MapError::NoCurrent)?;
        self.map.set_value(id, value)
    }

    /// Remove the value of the entry last returned by `next`.
    ///
    /// Fails with `MapError::NoCurrent` before any `next` or when called
    /// twice for one position. A hook rejection leaves the position intact,
    /// so the caller may retry.
    pub fn remove_current(&mut self) -> Result<Option<V>, MapError> {
        let id = self.walker.last().ok_or(MapError::NoCurrent)?;
        let old = self.map.set_value(id, None)?;
        self.walker.clear_last();
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::{BuildHasher, Hasher};
    use std::collections::BTreeSet;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Absent-valued buckets are skipped wherever they sit in a chain.
    #[test]
    fn iteration_skips_absent_values() {
        let mut m: RetainedMap<String, i32, ConstBuildHasher> =
            RetainedMap::with_capacity_and_hasher(4, ConstBuildHasher);
        for k in ["a", "b", "c", "d"] {
            m.insert(k.to_string(), 0).unwrap();
        }
        m.remove("a").unwrap(); // head of the chain
        m.remove("c").unwrap(); // middle

        let keys: Vec<String> = m.entries().map(|(_, k, _)| k.clone()).collect();
        assert_eq!(keys, ["b", "d"]);

        m.remove("b").unwrap();
        m.remove("d").unwrap();
        assert_eq!(m.entries().count(), 0, "all-absent chain yields nothing");
    }

    /// The walker crosses empty head slots and resumes at later chains.
    #[test]
    fn iteration_spans_sparse_slots() {
        let mut m: RetainedMap<String, i32> = RetainedMap::with_capacity(16);
        let keys: BTreeSet<String> = (0..6).map(|i| format!("k{i}")).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as i32).unwrap();
        }
        let seen: BTreeSet<String> = m.entries().map(|(_, k, _)| k.clone()).collect();
        assert_eq!(seen, keys);
    }

    /// Cursor removal discipline: no current before `next`, exactly one
    /// removal per position, and `len` moves by one.
    #[test]
    fn remove_current_discipline() {
        let mut m: RetainedMap<String, i32> = RetainedMap::new();
        for k in ["a", "b"] {
            m.insert(k.to_string(), 1).unwrap();
        }

        let mut cursor = m.entries_mut();
        assert_eq!(cursor.remove_current(), Err(MapError::NoCurrent));

        let (_, _, _) = cursor.next().expect("first entry");
        assert_eq!(cursor.remove_current().unwrap(), Some(1));
        assert_eq!(cursor.remove_current(), Err(MapError::NoCurrent));

        let (_, _, _) = cursor.next().expect("second entry");
        assert_eq!(cursor.remove_current().unwrap(), Some(1));
        assert!(cursor.next().is_none());
        drop(cursor);

        assert_eq!(m.len(), 0);
        assert_eq!(m.entries().count(), 0);
    }

    /// `set_current` rewrites in place without disturbing the position, so
    /// a write can be followed by removal of the same entry.
    #[test]
    fn set_current_keeps_position() {
        let mut m: RetainedMap<String, i32> = RetainedMap::new();
        m.insert("a".to_string(), 1).unwrap();

        let mut cursor = m.entries_mut();
        assert_eq!(cursor.set_current(Some(9)), Err(MapError::NoCurrent));
        cursor.next().expect("entry");
        assert_eq!(cursor.set_current(Some(9)).unwrap(), Some(1));
        assert_eq!(cursor.remove_current().unwrap(), Some(9));
        drop(cursor);
        assert_eq!(m.len(), 0);
    }

    /// The read-only iterator refuses removal outright.
    #[test]
    fn read_only_iterator_refuses_removal() {
        let mut m: RetainedMap<String, i32> = RetainedMap::new();
        m.insert("a".to_string(), 1).unwrap();

        let mut it = m.entries();
        assert_eq!(it.remove_current(), Err(MapError::NotPermitted));
        let _ = it.next();
        assert_eq!(it.remove_current(), Err(MapError::NotPermitted));
        drop(it);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("a"), Some(&1));
    }
}
