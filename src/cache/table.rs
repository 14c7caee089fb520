//! Memory Table Module
//!
//! In-memory half of the cache: HashMap storage with FIFO tracking and a
//! capacity bound by entry count or estimated bytes.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::cache::{ByteSize, CacheEntry, Capacity, FifoTracker};

// == Memory Table ==
/// In-memory key-value table with FIFO eviction.
pub struct MemoryTable<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Insertion order tracker
    order: FifoTracker<K>,
    /// Bound enforced after every insertion
    capacity: Capacity,
    /// Sum of entry sizes
    bytes: usize,
}

impl<K, V> MemoryTable<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: ByteSize,
{
    // == Constructor ==
    /// Creates an empty table with the given capacity.
    pub fn new(capacity: Capacity) -> Self {
        Self {
            entries: HashMap::new(),
            order: FifoTracker::new(),
            capacity,
            bytes: 0,
        }
    }

    // == Get ==
    /// Returns the value for `key`, if held. Does not affect eviction order.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    // == Put ==
    /// Inserts or overwrites an entry, then evicts until within capacity.
    ///
    /// An overwrite keeps the key's original position in the FIFO order.
    /// The key just written is never evicted, so a single entry larger than
    /// the byte bound is kept alone rather than rejected.
    ///
    /// Returns the evicted keys, oldest first.
    pub fn put(&mut self, key: K, value: V) -> Vec<K> {
        let entry = CacheEntry::new(value);
        self.bytes += entry.size;

        match self.entries.insert(key.clone(), entry) {
            Some(previous) => self.bytes -= previous.size,
            None => self.order.push(key.clone()),
        }

        let mut evicted = Vec::new();
        while self.capacity.exceeded_by(self.entries.len(), self.bytes) {
            let Some(oldest) = self.order.evict_oldest_except(&key) else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.bytes -= entry.size;
            }
            debug!(key = ?oldest, "evicted from memory table");
            evicted.push(oldest);
        }
        evicted
    }

    // == Remove ==
    /// Removes an entry by key. Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        self.bytes -= entry.size;
        Some(entry.into_value())
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.bytes = 0;
    }

    // == Size ==
    /// Current size in the unit of the capacity mode: bytes for
    /// [`Capacity::MaxBytes`], entry count otherwise.
    pub fn size(&self) -> usize {
        match self.capacity {
            Capacity::MaxBytes(_) => self.bytes,
            Capacity::MaxEntries(_) | Capacity::Unbounded => self.entries.len(),
        }
    }

    /// Whether one more entry of `size` bytes fits without eviction.
    pub fn has_room_for(&self, size: usize) -> bool {
        self.capacity.admits(self.entries.len(), self.bytes, size)
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimated bytes held, regardless of capacity mode.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Entries from oldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|entry| (key, &entry.value)))
    }
}

impl<K, V> fmt::Debug for MemoryTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTable")
            .field("entries", &self.entries.len())
            .field("bytes", &self.bytes)
            .field("capacity", &self.capacity)
            .finish()
    }
}
