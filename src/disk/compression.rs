//! Record compression.
//!
//! Every record the ledger writes passes through the same transform, so a
//! ledger file is either entirely compressed or entirely raw.

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Compression applied to each ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Records are stored as encoded
    #[default]
    None,
    /// Gzip framing around deflate
    Gzip,
    /// Zlib framing around deflate
    Zlib,
}

impl Compression {
    /// Infers the compression from a data file extension: `.gz` selects
    /// gzip, `.zz` or `.zlib` selects zlib, anything else none.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zz") | Some("zlib") => Compression::Zlib,
            _ => Compression::None,
        }
    }

    pub fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::fast());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }

    pub fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Compression::None => out.extend_from_slice(data),
            Compression::Gzip => {
                GzDecoder::new(data).read_to_end(&mut out)?;
            }
            Compression::Zlib => {
                ZlibDecoder::new(data).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zlib => "zlib",
        };
        f.write_str(name)
    }
}

impl FromStr for Compression {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zlib" => Ok(Compression::Zlib),
            other => Err(CacheError::UnknownCompression(other.to_string())),
        }
    }
}
