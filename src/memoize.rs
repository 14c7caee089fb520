//! Memoized computation facade.
//!
//! Wraps a computation so that repeated calls with equal arguments are served
//! from memory, then from the disk ledger, and only then recomputed.
//! Persisting to disk and reloading from it are explicit operations.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{ByteSize, CacheStats, MemoryTable};
use crate::codec::{BincodeCodec, CacheKey, HashKeyCodec, KeyCodec, ValueCodec};
use crate::config::CacheConfig;
use crate::disk::DiskLedger;
use crate::error::{CacheError, Result};
use crate::sync::{self, SyncDirection, SyncReport};

// == Memoized ==
/// A computation wrapped with a memory table and a disk ledger.
///
/// `A` is the argument type (use a tuple for several arguments), `V` the
/// result type. Not internally synchronized: wrap it in a mutex to share it
/// across threads.
pub struct Memoized<A, V, F, K = HashKeyCodec, C = BincodeCodec> {
    /// Identity used for logging and default file naming
    name: String,
    /// The wrapped computation
    computation: F,
    /// Argument to key mapping
    keys: K,
    /// Value to bytes mapping for the ledger
    codec: C,
    /// In-memory entries
    memory: MemoryTable<CacheKey, V>,
    /// On-disk records
    ledger: DiskLedger<CacheKey>,
    /// Call counters
    stats: CacheStats,
    _args: PhantomData<fn(&A)>,
}

impl<A, V, F> Memoized<A, V, F>
where
    A: Serialize,
    V: ByteSize + Clone + Serialize + DeserializeOwned,
    F: FnMut(&A) -> V,
{
    // == Constructor ==
    /// Wraps `computation` using the default codecs.
    ///
    /// The computation's type name serves as its identity. Every closure in
    /// one function shares a type name, so closures are rejected unless the
    /// config carries an explicit path; use [`Memoized::named`] for them.
    pub fn new(computation: F, config: CacheConfig) -> Result<Self> {
        let identity = type_name::<F>();
        if identity.contains("{{closure}}") && config.path.is_none() {
            return Err(CacheError::UnnamedComputation {
                type_name: identity.to_string(),
            });
        }
        Self::named(identity, computation, config)
    }

    /// Wraps `computation` under an explicit identity.
    ///
    /// The identity is mixed into every key, so computations sharing a
    /// ledger file never serve each other's results.
    pub fn named(name: impl Into<String>, computation: F, config: CacheConfig) -> Result<Self> {
        let name = name.into();
        let keys = HashKeyCodec::with_discriminator(key_tag::<A>(&name));
        Self::with_codecs(name, computation, config, keys, BincodeCodec)
    }
}

/// Key discriminator for a computation identity and its argument type.
fn key_tag<A>(name: &str) -> String {
    format!("{name}/{}", type_name::<A>())
}

impl<A, V, F, K, C> Memoized<A, V, F, K, C>
where
    V: ByteSize + Clone,
    F: FnMut(&A) -> V,
    K: KeyCodec<A>,
    C: ValueCodec<V>,
{
    /// Wraps `computation` with caller-supplied codecs.
    ///
    /// Fails fast on a contradictory capacity, and when an existing ledger
    /// index at the resolved path cannot be loaded.
    pub fn with_codecs(
        name: impl Into<String>,
        computation: F,
        config: CacheConfig,
        keys: K,
        codec: C,
    ) -> Result<Self> {
        let name = name.into();
        let capacity = config.capacity()?;
        let path = config.resolve_path(&name);
        let ledger = DiskLedger::open(path, config.compression())?;

        info!(
            name = %name,
            path = %ledger.path().display(),
            ?capacity,
            disk_records = ledger.len(),
            "memoized computation ready"
        );

        Ok(Self {
            name,
            computation,
            keys,
            codec,
            memory: MemoryTable::new(capacity),
            ledger,
            stats: CacheStats::new(),
            _args: PhantomData,
        })
    }

    // == Call ==
    /// Returns the result for `args`, from memory, disk, or by computing it.
    ///
    /// A disk hit or a computation inserts the value into memory, which may
    /// evict older entries. Nothing is written to disk here.
    pub fn call(&mut self, args: &A) -> Result<V> {
        let key = self.keys.key_of(args)?;

        if let Some(value) = self.memory.get(&key) {
            self.stats.record_hit();
            return Ok(value.clone());
        }

        let value = match self.ledger.read(&key)? {
            Some(bytes) => {
                debug!(%key, "served from disk");
                self.stats.record_disk_hit();
                self.codec.decode(&bytes)?
            }
            None => {
                debug!(%key, "computing");
                self.stats.record_miss();
                (self.computation)(args)
            }
        };

        let evicted = self.memory.put(key, value.clone());
        self.stats.record_evictions(evicted.len());
        Ok(value)
    }

    /// Key under which the result for `args` is stored.
    pub fn key_of(&self, args: &A) -> Result<CacheKey> {
        self.keys.key_of(args)
    }

    /// Whether a result for `args` is held in memory or on disk.
    pub fn contains(&self, args: &A) -> Result<bool> {
        let key = self.key_of(args)?;
        Ok(self.memory.contains(&key) || self.ledger.contains(&key))
    }

    // == Persist ==
    /// Writes the memory entries to the ledger. Returns records appended.
    pub fn persist(&mut self) -> Result<usize> {
        let saved = sync::save_to_disk(&self.memory, &mut self.ledger, &self.codec)?;
        info!(name = %self.name, saved, "persisted memory cache");
        Ok(saved)
    }

    // == Empty ==
    /// Clears the memory table, and the ledger too when `also_disk` is set.
    pub fn empty(&mut self, also_disk: bool) -> Result<()> {
        self.memory.clear();
        if also_disk {
            self.ledger.erase()?;
        }
        info!(name = %self.name, also_disk, "emptied cache");
        Ok(())
    }

    // == Sync ==
    /// Reconciles memory and disk in the given direction.
    pub fn sync(&mut self, direction: SyncDirection) -> Result<SyncReport> {
        let before = self.memory.len();
        let report = sync::synchronize(&mut self.memory, &mut self.ledger, &self.codec, direction)?;
        // Loading only fills free room, so nothing is evicted here.
        debug_assert!(self.memory.len() == before + report.loaded);
        Ok(report)
    }

    // == Accessors ==
    /// Counters with current memory totals filled in.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_totals(self.memory.len(), self.memory.bytes());
        stats
    }

    pub fn memory(&self) -> &MemoryTable<CacheKey, V> {
        &self.memory
    }

    pub fn ledger(&self) -> &DiskLedger<CacheKey> {
        &self.ledger
    }

    pub fn path(&self) -> &Path {
        self.ledger.path()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries in memory.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

impl<A, V: ByteSize, F, K, C> fmt::Display for Memoized<A, V, F, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Memoized {:?} (memory: {} entries, {} bytes; disk: {} records at {})",
            self.name,
            self.memory.len(),
            self.memory.bytes(),
            self.ledger.len(),
            self.ledger.path().display()
        )
    }
}

impl<A, V, F, K, C> fmt::Debug for Memoized<A, V, F, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("memory", &self.memory)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}
