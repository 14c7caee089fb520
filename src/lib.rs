//! Memo Cache - Memoization with memory and disk tiers
//!
//! Caches computed function outputs keyed by call arguments. Entries live in
//! a FIFO-evicting memory table bounded by entry count or estimated bytes,
//! and can be persisted to and reloaded from an append-only disk ledger.

pub mod cache;
pub mod codec;
pub mod config;
pub mod disk;
pub mod error;
pub mod memoize;
pub mod sync;

pub use cache::{ByteSize, CacheStats, Capacity, MemoryTable};
pub use codec::{BincodeCodec, CacheKey, HashKeyCodec, KeyCodec, ValueCodec};
pub use config::CacheConfig;
pub use disk::{Compression, DiskLedger};
pub use error::{CacheError, Result};
pub use memoize::Memoized;
pub use sync::{SyncDirection, SyncReport};
