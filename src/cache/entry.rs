//! Cache Entry Module
//!
//! Defines the slot stored per key in the memory table.

use crate::cache::ByteSize;

// == Cache Entry ==
/// A cached value together with its estimated size.
///
/// The size is measured once at insertion so that removals subtract exactly
/// what was added, even for values whose estimate could drift.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Estimated size in bytes at insertion time
    pub size: usize,
}

impl<V: ByteSize> CacheEntry<V> {
    // == Constructor ==
    /// Wraps a value, measuring it with its [`ByteSize`] estimate.
    pub fn new(value: V) -> Self {
        let size = value.byte_size();
        Self { value, size }
    }
}

impl<V> CacheEntry<V> {
    /// Consumes the entry, returning the value.
    pub fn into_value(self) -> V {
        self.value
    }
}
