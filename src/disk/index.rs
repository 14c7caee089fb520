//! Ledger index and its sidecar file.
//!
//! The data file has no framing, so the index is the only way back to a
//! record. It is stored next to the data file as `<data file>.idx`:
//!
//! ```json
//! {
//!   "format_version": 2,
//!   "compression": "gzip",
//!   "records": [
//!     { "key": "9f0c…", "offset": 0, "length": 31, "checksum": 1234 }
//!   ]
//! }
//! ```
//!
//! Records are listed in append order. Each key appears once, pointing at
//! its newest record. Version 2 spans include the one-byte record marker, so
//! a valid span is never empty.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::disk::Compression;
use crate::error::{CacheError, Result};

/// Current sidecar format version.
const INDEX_FORMAT_VERSION: u32 = 2;

/// Byte range of one record in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start of the record
    pub offset: u64,
    /// Stored (possibly compressed) length, always > 0
    pub length: u64,
    /// XXH3-64 of the uncompressed record
    pub checksum: u64,
}

impl Span {
    /// End of the record, or `None` if it lies beyond `u64::MAX`.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    /// Whether the span is non-empty and lies within `file_len` bytes.
    pub fn fits_within(&self, file_len: u64) -> bool {
        self.length > 0 && self.end().is_some_and(|end| end <= file_len)
    }
}

#[derive(Serialize, Deserialize)]
struct IndexRecord<K> {
    key: K,
    offset: u64,
    length: u64,
    checksum: u64,
}

#[derive(Serialize, Deserialize)]
struct IndexFile<K> {
    format_version: u32,
    compression: Compression,
    records: Vec<IndexRecord<K>>,
}

/// Ordered mapping from key to the span of its newest record.
#[derive(Debug, Clone)]
pub struct LedgerIndex<K> {
    spans: BTreeMap<K, Span>,
}

impl<K> Default for LedgerIndex<K> {
    fn default() -> Self {
        Self {
            spans: BTreeMap::new(),
        }
    }
}

impl<K> LedgerIndex<K>
where
    K: Ord + Clone + fmt::Display + Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the sidecar at `path`.
    ///
    /// Returns `Ok(None)` if there is no sidecar. A sidecar written with a
    /// different format version or compression is rejected.
    pub fn load(path: &Path, compression: Compression) -> Result<Option<Self>> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let file: IndexFile<K> =
            serde_json::from_slice(&raw).map_err(|e| CacheError::IndexFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if file.format_version != INDEX_FORMAT_VERSION {
            return Err(CacheError::IndexFormat {
                path: path.to_path_buf(),
                reason: format!(
                    "format version {} (expected {})",
                    file.format_version, INDEX_FORMAT_VERSION
                ),
            });
        }
        if file.compression != compression {
            return Err(CacheError::IndexFormat {
                path: path.to_path_buf(),
                reason: format!(
                    "records use {} compression, ledger configured for {}",
                    file.compression, compression
                ),
            });
        }

        let mut index = Self::new();
        for record in file.records {
            index.insert(
                record.key,
                Span {
                    offset: record.offset,
                    length: record.length,
                    checksum: record.checksum,
                },
            );
        }
        Ok(Some(index))
    }

    /// Writes the sidecar to `path`, records in append order.
    pub fn save(&self, path: &Path, compression: Compression) -> Result<()> {
        let records = self
            .in_append_order()
            .into_iter()
            .map(|(key, span)| IndexRecord {
                key: key.clone(),
                offset: span.offset,
                length: span.length,
                checksum: span.checksum,
            })
            .collect();

        let file = IndexFile {
            format_version: INDEX_FORMAT_VERSION,
            compression,
            records,
        };

        let json = serde_json::to_vec_pretty(&file).map_err(|e| CacheError::IndexFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| CacheError::io(path, e))
    }

    /// Checks that every span lies within a data file of `file_len` bytes.
    pub fn validate(&self, file_len: u64) -> Result<()> {
        for (key, span) in &self.spans {
            if !span.fits_within(file_len) {
                return Err(CacheError::IndexOutOfRange {
                    key: key.to_string(),
                    offset: span.offset,
                    length: span.length,
                    file_len,
                });
            }
        }
        Ok(())
    }

    /// Points `key` at `span`, replacing any older record.
    pub fn insert(&mut self, key: K, span: Span) {
        self.spans.insert(key, span);
    }

    pub fn get(&self, key: &K) -> Option<&Span> {
        self.spans.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.spans.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Span)> {
        self.spans.iter()
    }

    /// Entries sorted by offset, oldest record first.
    pub fn in_append_order(&self) -> Vec<(&K, &Span)> {
        let mut records: Vec<_> = self.spans.iter().collect();
        records.sort_by_key(|(_, span)| span.offset);
        records
    }

    /// Keys sorted by offset, newest record first.
    pub fn keys_newest_first(&self) -> Vec<K> {
        self.in_append_order()
            .into_iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }
}
