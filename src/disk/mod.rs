//! Disk Module
//!
//! Persistent half of the cache: an append-only data file of encoded
//! records and the index that locates them.

mod compression;
mod index;
mod ledger;

pub use compression::Compression;
pub use index::{LedgerIndex, Span};
pub use ledger::{index_path_for, DiskLedger};
