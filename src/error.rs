//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror. A cache miss is never
//! represented here; only structural failures (codec, I/O, configuration).

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the memoization cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value or argument tuple could not be encoded or decoded
    #[error("encoding error: {reason}")]
    Encoding {
        /// Description of the codec failure
        reason: String,
    },

    /// An I/O error occurred on the ledger data file or its index
    #[error("ledger I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// An index span points outside the current data file
    #[error("record for {key} at {offset}+{length} exceeds file length {file_len}")]
    IndexOutOfRange {
        /// Rendered key of the record
        key: String,
        /// Start of the record
        offset: u64,
        /// Length of the record
        length: u64,
        /// Current data file length
        file_len: u64,
    },

    /// A record read back from disk does not match its recorded checksum
    #[error("checksum mismatch for {key}: expected {expected:016x}, got {actual:016x}")]
    ChecksumMismatch {
        /// Rendered key of the record
        key: String,
        /// Checksum stored in the index
        expected: u64,
        /// Checksum of the bytes actually read
        actual: u64,
    },

    /// The index sidecar could not be parsed or does not match this ledger
    #[error("invalid ledger index at {path}: {reason}")]
    IndexFormat {
        /// The index file path
        path: PathBuf,
        /// Description of the problem
        reason: String,
    },

    /// Capacity limits are contradictory or zero
    #[error("capacity misconfiguration: {reason}")]
    CapacityMisconfiguration {
        /// Description of the misconfiguration
        reason: String,
    },

    /// A stored record is missing its leading marker byte
    #[error("corrupt record for {key}: {reason}")]
    CorruptRecord {
        /// Rendered key of the record
        key: String,
        /// Description of the problem
        reason: String,
    },

    /// A closure was wrapped without an explicit name or ledger path
    #[error("computation {type_name} has no stable identity; use Memoized::named or an explicit path")]
    UnnamedComputation {
        /// Type name of the wrapped computation
        type_name: String,
    },

    /// Sync direction string was not one of "disk", "memory" or "both"
    #[error("unknown sync direction: {0}")]
    UnknownSyncDirection(String),

    /// Compression name was not recognized
    #[error("unknown compression: {0}")]
    UnknownCompression(String),
}

impl CacheError {
    /// Wraps an I/O error together with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an encoding error from any displayable codec failure.
    pub(crate) fn encoding(err: impl std::fmt::Display) -> Self {
        CacheError::Encoding {
            reason: err.to_string(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the memoization cache.
pub type Result<T> = std::result::Result<T, CacheError>;
