//! Cache Statistics Module
//!
//! Tracks memoization metrics: memory hits, disk hits, computations, evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Calls answered from the memory table
    pub hits: u64,
    /// Calls answered from the disk ledger
    pub disk_hits: u64,
    /// Calls that ran the wrapped computation
    pub misses: u64,
    /// Number of entries evicted by the FIFO policy
    pub evictions: u64,
    /// Current number of entries in memory
    pub total_entries: usize,
    /// Current estimated size of memory entries in bytes
    pub total_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the fraction of calls that avoided recomputation.
    ///
    /// Returns (hits + disk_hits) / total calls, or 0.0 if no calls were made.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.disk_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_disk_hit(&mut self) {
        self.disk_hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Adds `count` to the eviction counter.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Update Sizes ==
    /// Updates the current entry count and byte size.
    pub fn set_totals(&mut self, entries: usize, bytes: usize) {
        self.total_entries = entries;
        self.total_bytes = bytes;
    }
}
