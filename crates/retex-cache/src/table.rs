//! Sharded concurrent hash table with append-only collision chains.
//!
//! Three instances of [`ShardedTable`] back the cache: identifier to source
//! path, identifier to loaded texture, and identifier to loaded volume
//! texture. Locking is per bucket, so lookups on different buckets never
//! contend, and a lookup never blocks on any bucket other than its own.
//!
//! Inserts append at the head of the target bucket's chain *without* checking
//! for an existing identifier. Duplicates are intentional: replacing an entry
//! in place could release a texture a concurrent reader is using at that
//! instant. Superseded handles are only released when a published snapshot
//! that held them is retired during a rebuild.

use parking_lot::Mutex;

/// Default bucket count, matching the original table sizing.
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// Source-path entry. The content-space identifier starts at zero and is
/// back-filled once after the first successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEntry {
    /// Arena-interned source path.
    pub path: &'static str,
    /// Content-space identifier, or 0 if not yet computed.
    pub content_hash: u32,
}

impl PathEntry {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            content_hash: 0,
        }
    }
}

struct Slot<V> {
    hash: u32,
    value: V,
}

/// Fixed-shard concurrent table keyed by 32-bit identifiers.
pub struct ShardedTable<V> {
    buckets: Box<[Mutex<Vec<Slot<V>>>]>,
    mask: usize,
}

impl<V: Clone> ShardedTable<V> {
    /// Create a table with [`DEFAULT_BUCKET_COUNT`] buckets.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    /// Create a table with a fixed power-of-two bucket count.
    pub fn with_buckets(bucket_count: usize) -> Self {
        assert!(
            bucket_count.is_power_of_two(),
            "bucket count must be a power of two"
        );
        let buckets = (0..bucket_count)
            .map(|_| Mutex::new(Vec::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buckets,
            mask: bucket_count - 1,
        }
    }

    #[inline]
    fn bucket(&self, hash: u32) -> &Mutex<Vec<Slot<V>>> {
        &self.buckets[hash as usize & self.mask]
    }

    /// Append an entry at the head of its bucket chain.
    ///
    /// Never checks for an existing identifier; collisions and duplicates are
    /// both legal and expected.
    pub fn insert(&self, hash: u32, value: V) {
        self.bucket(hash).lock().push(Slot { hash, value });
    }

    /// Find the most recently inserted entry with exactly this identifier.
    pub fn lookup(&self, hash: u32) -> Option<V> {
        let bucket = self.bucket(hash).lock();
        bucket
            .iter()
            .rev()
            .find(|slot| slot.hash == hash)
            .map(|slot| slot.value.clone())
    }

    /// Mutate the most recently inserted entry with exactly this identifier.
    ///
    /// Returns whether an entry was found. Used to back-fill a path entry's
    /// content hash after its first load.
    pub fn update<F>(&self, hash: u32, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut bucket = self.bucket(hash).lock();
        match bucket.iter_mut().rev().find(|slot| slot.hash == hash) {
            Some(slot) => {
                f(&mut slot.value);
                true
            }
            None => false,
        }
    }

    /// Visit every entry, most recent first within each bucket.
    ///
    /// Each bucket is visited under its own lock; the callback must not
    /// re-enter the table.
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(u32, &V),
    {
        for bucket in self.buckets.iter() {
            let bucket = bucket.lock();
            for slot in bucket.iter().rev() {
                callback(slot.hash, &slot.value);
            }
        }
    }

    /// Total entry count across all buckets, duplicates included.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.lock().is_empty())
    }
}

impl<V: Clone> Default for ShardedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_lookup() {
        let table = ShardedTable::with_buckets(16);
        table.insert(0xAAAA_0001, "a");
        table.insert(0xAAAA_0002, "b");
        assert_eq!(table.lookup(0xAAAA_0001), Some("a"));
        assert_eq!(table.lookup(0xAAAA_0002), Some("b"));
        assert_eq!(table.lookup(0xAAAA_0003), None);
    }

    #[test]
    fn test_bucket_collisions_resolve_by_exact_hash() {
        // With 16 buckets, hashes 0x10 apart collide.
        let table = ShardedTable::with_buckets(16);
        table.insert(0x01, "one");
        table.insert(0x11, "seventeen");
        table.insert(0x21, "thirty-three");
        assert_eq!(table.lookup(0x01), Some("one"));
        assert_eq!(table.lookup(0x11), Some("seventeen"));
        assert_eq!(table.lookup(0x21), Some("thirty-three"));
    }

    #[test]
    fn test_duplicate_inserts_keep_both_newest_wins() {
        let table = ShardedTable::with_buckets(16);
        table.insert(0x42, "old");
        table.insert(0x42, "new");
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(0x42), Some("new"));
    }

    #[test]
    fn test_update_hits_newest_entry() {
        let table = ShardedTable::with_buckets(16);
        table.insert(0x42, PathEntry::new("old.dds"));
        table.insert(0x42, PathEntry::new("new.dds"));
        assert!(table.update(0x42, |e| e.content_hash = 0xCAFE));
        let entry = table.lookup(0x42).unwrap();
        assert_eq!(entry.path, "new.dds");
        assert_eq!(entry.content_hash, 0xCAFE);
        assert!(!table.update(0x99, |e| e.content_hash = 1));
    }

    #[test]
    fn test_for_each_visits_all_entries() {
        let table = ShardedTable::with_buckets(16);
        for i in 0..100u32 {
            table.insert(i, i * 2);
        }
        let mut seen = 0;
        table.for_each(|hash, value| {
            assert_eq!(*value, hash * 2);
            seen += 1;
        });
        assert_eq!(seen, 100);
    }

    #[test]
    fn test_no_lost_updates_under_concurrency() {
        const THREADS: u32 = 8;
        const PER_THREAD: u32 = 1_000;

        let table = Arc::new(ShardedTable::with_buckets(64));
        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let table = Arc::clone(&table);
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        let hash = t * PER_THREAD + i;
                        table.insert(hash, hash);
                    }
                });
            }
        });

        assert_eq!(table.len(), (THREADS * PER_THREAD) as usize);
        for hash in 0..THREADS * PER_THREAD {
            assert_eq!(table.lookup(hash), Some(hash));
        }
    }
}
