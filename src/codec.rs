//! Key and value codecs.
//!
//! The cache core only needs two collaborators from the outside world: a
//! deterministic mapping from call arguments to a [`CacheKey`], and a byte
//! encoding for computed values. Both are traits so callers can swap them;
//! the defaults hash and encode through bincode's serde mode.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// A 128-bit key identifying one argument tuple.
///
/// Computed with XXH3-128 by [`HashKeyCodec`]. Two calls with equal
/// arguments (and equal discriminators) always produce the same key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CacheKey([u8; 16]);

impl CacheKey {
    /// Hashes a byte slice into a key.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for CacheKey {
    type Error = String;

    fn try_from(hex: String) -> std::result::Result<Self, Self::Error> {
        if hex.len() != 32 || !hex.is_ascii() {
            return Err(format!("expected 32 hex characters, got {:?}", hex));
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
                .map_err(|e| format!("invalid hex in key {:?}: {}", hex, e))?;
        }
        Ok(Self(bytes))
    }
}

// == Key Codec ==
/// Maps an argument tuple to a cache key.
pub trait KeyCodec<A: ?Sized> {
    /// Computes the key for `args`. Must be deterministic.
    fn key_of(&self, args: &A) -> Result<CacheKey>;
}

/// Default key codec: XXH3-128 over the bincode encoding of the arguments.
///
/// The optional discriminator is hashed in front of the arguments, so two
/// caches wrapping different computations can share a key space without
/// colliding.
#[derive(Debug, Clone, Default)]
pub struct HashKeyCodec {
    discriminator: Option<String>,
}

impl HashKeyCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec that mixes `discriminator` into every key.
    pub fn with_discriminator(discriminator: impl Into<String>) -> Self {
        Self {
            discriminator: Some(discriminator.into()),
        }
    }
}

impl<A: Serialize + ?Sized> KeyCodec<A> for HashKeyCodec {
    fn key_of(&self, args: &A) -> Result<CacheKey> {
        let mut buf = Vec::new();
        if let Some(tag) = &self.discriminator {
            buf.extend_from_slice(tag.as_bytes());
            buf.push(0);
        }
        let encoded = bincode::serde::encode_to_vec(args, bincode::config::standard())
            .map_err(CacheError::encoding)?;
        buf.extend_from_slice(&encoded);
        Ok(CacheKey::from_bytes(&buf))
    }
}

// == Value Codec ==
/// Encodes computed values to bytes and back. Must round-trip exactly.
pub trait ValueCodec<V> {
    fn encode(&self, value: &V) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<V>;
}

/// Default value codec using bincode's standard configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<V: Serialize + DeserializeOwned> ValueCodec<V> for BincodeCodec {
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(CacheError::encoding)
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(CacheError::encoding)?;
        Ok(value)
    }
}
