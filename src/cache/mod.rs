//! Cache Module
//!
//! Provides the in-memory table with FIFO eviction under an entry-count or
//! byte-size capacity.

mod capacity;
mod entry;
mod fifo;
mod size;
mod stats;
mod table;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use capacity::Capacity;
pub use entry::CacheEntry;
pub use fifo::FifoTracker;
pub use size::ByteSize;
pub use stats::CacheStats;
pub use table::MemoryTable;
