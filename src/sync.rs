//! Memory-disk synchronization.
//!
//! Reconciles a [`MemoryTable`] with a [`DiskLedger`]. Saving appends memory
//! entries to the ledger; loading pulls the newest disk records into the free
//! room of the memory table. Neither direction runs implicitly.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{ByteSize, MemoryTable};
use crate::codec::ValueCodec;
use crate::disk::DiskLedger;
use crate::error::{CacheError, Result};

// == Sync Direction ==
/// Which store is the source of truth for a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Load disk records into memory ("disk")
    Disk,
    /// Save memory entries to disk ("memory")
    Memory,
    /// Save, then load ("both")
    Both,
}

impl FromStr for SyncDirection {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disk" => Ok(SyncDirection::Disk),
            "memory" => Ok(SyncDirection::Memory),
            "both" => Ok(SyncDirection::Both),
            other => Err(CacheError::UnknownSyncDirection(other.to_string())),
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncDirection::Disk => "disk",
            SyncDirection::Memory => "memory",
            SyncDirection::Both => "both",
        })
    }
}

// == Sync Report ==
/// Outcome of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records appended to the ledger
    pub saved: usize,
    /// Entries loaded into memory
    pub loaded: usize,
}

// == Save ==
/// Appends every memory entry to the ledger, oldest first.
///
/// Creates the data file on first write. Entries whose newest record is
/// byte-identical are skipped.
pub fn save_to_disk<K, V, C>(
    memory: &MemoryTable<K, V>,
    ledger: &mut DiskLedger<K>,
    codec: &C,
) -> Result<usize>
where
    K: Eq + Hash + Ord + Clone + fmt::Debug + fmt::Display + Serialize + DeserializeOwned,
    V: ByteSize,
    C: ValueCodec<V>,
{
    let saved = ledger.persist(memory.iter(), codec)?;
    debug!(saved, path = %ledger.path().display(), "saved memory table to ledger");
    Ok(saved)
}

// == Load ==
/// Loads disk records absent from memory, newest record first, while the
/// memory table has room for them.
///
/// Loading stops at the first record that does not fit, so what is brought
/// in is always the newest contiguous run of the ledger. Selected entries
/// are inserted oldest first, leaving the newest records last in line for
/// FIFO eviction. A missing data file is a no-op.
pub fn load_from_disk<K, V, C>(
    memory: &mut MemoryTable<K, V>,
    ledger: &DiskLedger<K>,
    codec: &C,
) -> Result<usize>
where
    K: Eq + Hash + Ord + Clone + fmt::Debug + fmt::Display + Serialize + DeserializeOwned,
    V: ByteSize,
    C: ValueCodec<V>,
{
    if !ledger.exists() {
        debug!(path = %ledger.path().display(), "no ledger file, nothing to load");
        return Ok(0);
    }

    let capacity = memory.capacity();
    let mut projected_len = memory.len();
    let mut projected_bytes = memory.bytes();
    let mut selected = Vec::new();

    for key in ledger.keys_newest_first() {
        if memory.contains(&key) {
            continue;
        }
        // Entry-count bound can be checked before paying for a decode.
        if !capacity.admits(projected_len, projected_bytes, 0) {
            break;
        }
        let Some(bytes) = ledger.read(&key)? else {
            continue;
        };
        let value = codec.decode(&bytes)?;
        let size = value.byte_size();
        if !capacity.admits(projected_len, projected_bytes, size) {
            break;
        }
        projected_len += 1;
        projected_bytes += size;
        selected.push((key, value));
    }

    let loaded = selected.len();
    for (key, value) in selected.into_iter().rev() {
        memory.put(key, value);
    }
    debug!(loaded, path = %ledger.path().display(), "loaded ledger records into memory");
    Ok(loaded)
}

// == Synchronize ==
/// Runs one sync in the given direction.
///
/// [`SyncDirection::Both`] saves first, so memory entries become the newest
/// records, then fills remaining memory room from the rest of the ledger.
pub fn synchronize<K, V, C>(
    memory: &mut MemoryTable<K, V>,
    ledger: &mut DiskLedger<K>,
    codec: &C,
    direction: SyncDirection,
) -> Result<SyncReport>
where
    K: Eq + Hash + Ord + Clone + fmt::Debug + fmt::Display + Serialize + DeserializeOwned,
    V: ByteSize,
    C: ValueCodec<V>,
{
    let mut report = SyncReport::default();
    if matches!(direction, SyncDirection::Memory | SyncDirection::Both) {
        report.saved = save_to_disk(memory, ledger, codec)?;
    }
    if matches!(direction, SyncDirection::Disk | SyncDirection::Both) {
        report.loaded = load_from_disk(memory, ledger, codec)?;
    }
    info!(
        %direction,
        saved = report.saved,
        loaded = report.loaded,
        "synchronized memory and disk"
    );
    Ok(report)
}
