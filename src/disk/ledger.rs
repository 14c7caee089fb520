//! Append-only record file plus its index.
//!
//! Records are appended at the end of the data file and never rewritten.
//! Re-appending a key leaves the old bytes in place; the index simply moves
//! to the newest record. There is no compaction.
//!
//! Each stored record is a marker byte followed by the (possibly compressed)
//! encoding, so values that encode to nothing still occupy a span.

use std::ffi::OsString;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::ValueCodec;
use crate::disk::{Compression, LedgerIndex, Span};
use crate::error::{CacheError, Result};

/// Extension appended to the data file name for the index sidecar.
const INDEX_SUFFIX: &str = ".idx";

/// Leading byte of every stored record.
const RECORD_MARKER: u8 = 0xA5;

/// On-disk store of encoded records addressed by key.
pub struct DiskLedger<K> {
    /// Data file holding the concatenated records
    path: PathBuf,
    /// Sidecar holding the index
    index_path: PathBuf,
    /// Transform applied to every record
    compression: Compression,
    /// Key to newest record
    index: LedgerIndex<K>,
}

impl<K> DiskLedger<K>
where
    K: Ord + Clone + fmt::Display + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Opens the ledger at `path`, loading the index of an existing file.
    ///
    /// Nothing is created on disk until the first append. A data file with
    /// no sidecar is kept, but its records are unreachable; new records are
    /// appended after them.
    pub fn open(path: impl Into<PathBuf>, compression: Compression) -> Result<Self> {
        let path = path.into();
        let index_path = index_path_for(&path);

        let data_len = file_len(&path)?;
        let index = match (data_len, LedgerIndex::load(&index_path, compression)?) {
            (Some(len), Some(index)) => {
                index.validate(len)?;
                debug!(path = %path.display(), records = index.len(), "loaded ledger index");
                index
            }
            (Some(len), None) => {
                warn!(
                    path = %path.display(),
                    bytes = len,
                    "ledger data has no index; existing records are unreachable"
                );
                LedgerIndex::new()
            }
            (None, Some(_)) => {
                warn!(path = %index_path.display(), "ignoring index without data file");
                LedgerIndex::new()
            }
            (None, None) => LedgerIndex::new(),
        };

        Ok(Self {
            path,
            index_path,
            compression,
            index,
        })
    }

    // == Append ==
    /// Appends one encoded record at the end of the file and saves the index.
    pub fn append(&mut self, key: K, encoded: &[u8]) -> Result<Span> {
        let span = self.append_record(key, encoded)?;
        self.save_index()?;
        Ok(span)
    }

    fn append_record(&mut self, key: K, encoded: &[u8]) -> Result<Span> {
        let payload = self
            .compression
            .compress(encoded)
            .map_err(|e| CacheError::io(&self.path, e))?;
        let mut stored = Vec::with_capacity(payload.len() + 1);
        stored.push(RECORD_MARKER);
        stored.extend_from_slice(&payload);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CacheError::io(&self.path, e))?;
        let offset = file
            .metadata()
            .map_err(|e| CacheError::io(&self.path, e))?
            .len();
        file.write_all(&stored)
            .map_err(|e| CacheError::io(&self.path, e))?;

        let span = Span {
            offset,
            length: stored.len() as u64,
            checksum: checksum(encoded),
        };
        debug!(%key, offset, length = span.length, "appended ledger record");
        self.index.insert(key, span);
        Ok(span)
    }

    fn save_index(&self) -> Result<()> {
        self.index.save(&self.index_path, self.compression)
    }

    // == Read ==
    /// Reads back the newest record for `key`, decompressed.
    ///
    /// Returns `Ok(None)` if the key is not indexed.
    pub fn read(&self, key: &K) -> Result<Option<Vec<u8>>> {
        let Some(span) = self.index.get(key).copied() else {
            return Ok(None);
        };

        let mut file = File::open(&self.path).map_err(|e| CacheError::io(&self.path, e))?;
        let len = file
            .metadata()
            .map_err(|e| CacheError::io(&self.path, e))?
            .len();
        if !span.fits_within(len) {
            return Err(CacheError::IndexOutOfRange {
                key: key.to_string(),
                offset: span.offset,
                length: span.length,
                file_len: len,
            });
        }

        let mut stored = vec![0u8; span.length as usize];
        file.seek(SeekFrom::Start(span.offset))
            .and_then(|_| file.read_exact(&mut stored))
            .map_err(|e| CacheError::io(&self.path, e))?;

        let payload = match stored.split_first() {
            Some((&RECORD_MARKER, payload)) => payload,
            _ => {
                return Err(CacheError::CorruptRecord {
                    key: key.to_string(),
                    reason: format!("missing marker at offset {}", span.offset),
                })
            }
        };
        let encoded = self
            .compression
            .decompress(payload)
            .map_err(|e| CacheError::io(&self.path, e))?;
        let actual = checksum(&encoded);
        if actual != span.checksum {
            return Err(CacheError::ChecksumMismatch {
                key: key.to_string(),
                expected: span.checksum,
                actual,
            });
        }
        Ok(Some(encoded))
    }

    // == Exists ==
    /// Whether the data file is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    // == Erase ==
    /// Deletes the data file and its index. Missing files are not an error.
    pub fn erase(&mut self) -> Result<()> {
        remove_if_present(&self.path)?;
        remove_if_present(&self.index_path)?;
        self.index.clear();
        info!(path = %self.path.display(), "erased ledger");
        Ok(())
    }

    // == Persist ==
    /// Encodes and appends every entry whose newest record differs from it.
    ///
    /// Entries already stored with identical bytes are skipped. The index is
    /// saved once at the end. Returns the number of records appended.
    pub fn persist<'a, V, C, I>(&mut self, entries: I, codec: &C) -> Result<usize>
    where
        K: 'a,
        V: 'a,
        C: ValueCodec<V>,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        let mut appended = 0;
        for (key, value) in entries {
            let encoded = codec.encode(value)?;
            if self.holds_identical(key, &encoded) {
                continue;
            }
            self.append_record(key.clone(), &encoded)?;
            appended += 1;
        }
        if appended > 0 {
            self.save_index()?;
        }
        Ok(appended)
    }

    fn holds_identical(&self, key: &K, encoded: &[u8]) -> bool {
        self.index
            .get(key)
            .is_some_and(|span| span.checksum == checksum(encoded))
    }

    // == Accessors ==
    /// Indexed keys, newest record first.
    pub fn keys_newest_first(&self) -> Vec<K> {
        self.index.keys_newest_first()
    }

    pub fn index(&self) -> &LedgerIndex<K> {
        &self.index
    }

    pub fn span(&self, key: &K) -> Option<Span> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}

impl<K> fmt::Debug for DiskLedger<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskLedger")
            .field("path", &self.path)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

// == Helpers ==
/// Returns `<path>.idx`.
pub fn index_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(INDEX_SUFFIX);
    PathBuf::from(name)
}

fn checksum(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(bytes)
}

fn file_len(path: &Path) -> Result<Option<u64>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}
