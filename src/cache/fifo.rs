//! FIFO Tracker Module
//!
//! Implements insertion-order tracking for cache eviction.

use std::collections::VecDeque;

// == FIFO Tracker ==
/// Tracks insertion order for first-in-first-out eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Unlike an LRU tracker, reads and overwrites never move a key.
#[derive(Debug)]
pub struct FifoTracker<K> {
    /// Keys in insertion order
    order: VecDeque<K>,
}

impl<K> Default for FifoTracker<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: PartialEq> FifoTracker<K> {
    // == Constructor ==
    /// Creates a new empty FIFO tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Records a newly inserted key at the back.
    ///
    /// Callers must only push keys that are not already tracked; an
    /// overwrite keeps its original position.
    pub fn push(&mut self, key: K) {
        self.order.push_back(key);
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest Except ==
    /// Removes and returns the oldest key that is not `keep`.
    ///
    /// Returns None if no such key exists.
    pub fn evict_oldest_except(&mut self, keep: &K) -> Option<K> {
        let pos = self.order.iter().position(|k| k != keep)?;
        self.order.remove(pos)
    }

    // == Iter ==
    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
