//! Configuration Module
//!
//! Handles construction parameters for a memoized computation, loadable from
//! environment variables.

use std::env;
use std::path::{Path, PathBuf};

use crate::cache::Capacity;
use crate::codec::CacheKey;
use crate::disk::Compression;
use crate::error::Result;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Capacity limits are validated by [`CacheConfig::capacity`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Explicit ledger data file; derived from the computation identity if unset
    pub path: Option<PathBuf>,
    /// Directory for derived ledger file names
    pub cache_dir: PathBuf,
    /// Maximum number of entries held in memory
    pub max_entries: Option<usize>,
    /// Maximum estimated bytes held in memory
    pub max_bytes: Option<usize>,
    /// Compression applied to ledger records; inferred from the path if unset
    pub compression: Option<Compression>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_CACHE_PATH` - Ledger data file (default: derived)
    /// - `MEMO_CACHE_DIR` - Directory for derived file names (default: system temp dir)
    /// - `MEMO_MAX_ENTRIES` - Entry-count capacity (default: unbounded)
    /// - `MEMO_MAX_BYTES` - Byte capacity (default: unbounded)
    /// - `MEMO_COMPRESSION` - `none`, `gzip` or `zlib` (default: inferred from
    ///   the path extension, else none)
    pub fn from_env() -> Self {
        Self {
            path: env::var("MEMO_CACHE_PATH").ok().map(PathBuf::from),
            cache_dir: env::var("MEMO_CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            max_entries: env::var("MEMO_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok()),
            max_bytes: env::var("MEMO_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            compression: env::var("MEMO_COMPRESSION")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Sets an explicit ledger path.
    ///
    /// Unless compression is set explicitly, it is inferred from the
    /// extension (see [`CacheConfig::compression`]).
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Sets the compression; takes precedence over the path extension.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Effective compression: the explicit setting, else inferred from the
    /// explicit path's extension, else none.
    pub fn compression(&self) -> Compression {
        match (self.compression, &self.path) {
            (Some(compression), _) => compression,
            (None, Some(path)) => Compression::from_path(path),
            (None, None) => Compression::None,
        }
    }

    /// Validated capacity. Fails if both limits are set or one is zero.
    pub fn capacity(&self) -> Result<Capacity> {
        Capacity::from_limits(self.max_entries, self.max_bytes)
    }

    /// Ledger path for a computation with the given identity.
    ///
    /// The explicit path wins; otherwise the file is
    /// `<cache_dir>/memo_<first 16 hex chars of hash(identity)>.bin`.
    pub fn resolve_path(&self, identity: &str) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => default_ledger_path(&self.cache_dir, identity),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            cache_dir: env::temp_dir(),
            max_entries: None,
            max_bytes: None,
            compression: None,
        }
    }
}

/// Derives a stable file name from a computation identity.
pub fn default_ledger_path(dir: &Path, identity: &str) -> PathBuf {
    let hash = CacheKey::from_bytes(identity.as_bytes()).to_string();
    dir.join(format!("memo_{}.bin", &hash[..16]))
}
