//! Capacity Module
//!
//! Defines the bound the memory table enforces after each insertion.

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Capacity ==
/// Upper bound on the in-memory table, by entry count or by estimated bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    /// No bound; nothing is ever evicted
    #[default]
    Unbounded,
    /// At most this many entries
    MaxEntries(usize),
    /// At most this many bytes, as measured by [`ByteSize`](crate::cache::ByteSize)
    MaxBytes(usize),
}

impl Capacity {
    // == Constructor ==
    /// Builds a capacity from two optional limits.
    ///
    /// Setting neither yields [`Capacity::Unbounded`]. Setting both, or
    /// setting either to zero, is a misconfiguration.
    pub fn from_limits(max_entries: Option<usize>, max_bytes: Option<usize>) -> Result<Self> {
        match (max_entries, max_bytes) {
            (Some(_), Some(_)) => Err(CacheError::CapacityMisconfiguration {
                reason: "max_entries and max_bytes are mutually exclusive".to_string(),
            }),
            (Some(0), None) => Err(CacheError::CapacityMisconfiguration {
                reason: "max_entries must be greater than zero".to_string(),
            }),
            (None, Some(0)) => Err(CacheError::CapacityMisconfiguration {
                reason: "max_bytes must be greater than zero".to_string(),
            }),
            (Some(n), None) => Ok(Capacity::MaxEntries(n)),
            (None, Some(b)) => Ok(Capacity::MaxBytes(b)),
            (None, None) => Ok(Capacity::Unbounded),
        }
    }

    /// Byte capacity given in KiB (1.0 = 1024 bytes), rounded down.
    pub fn from_kib(kib: f64) -> Result<Self> {
        if !kib.is_finite() || kib <= 0.0 {
            return Err(CacheError::CapacityMisconfiguration {
                reason: format!("KiB limit must be a positive number, got {}", kib),
            });
        }
        Self::from_limits(None, Some((kib * 1024.0) as usize))
    }

    // == Admits ==
    /// Whether a table holding `len` entries and `bytes` bytes stays within
    /// bound after adding one more entry of `extra` bytes.
    pub fn admits(&self, len: usize, bytes: usize, extra: usize) -> bool {
        match *self {
            Capacity::Unbounded => true,
            Capacity::MaxEntries(n) => len < n,
            Capacity::MaxBytes(b) => bytes.saturating_add(extra) <= b,
        }
    }

    /// Whether a table of the given shape exceeds the bound.
    pub fn exceeded_by(&self, len: usize, bytes: usize) -> bool {
        match *self {
            Capacity::Unbounded => false,
            Capacity::MaxEntries(n) => len > n,
            Capacity::MaxBytes(b) => bytes > b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_limits_valid() {
        assert_eq!(Capacity::from_limits(None, None).unwrap(), Capacity::Unbounded);
        assert_eq!(
            Capacity::from_limits(Some(3), None).unwrap(),
            Capacity::MaxEntries(3)
        );
        assert_eq!(
            Capacity::from_limits(None, Some(1024)).unwrap(),
            Capacity::MaxBytes(1024)
        );
    }

    #[test]
    fn test_from_limits_both_set() {
        let result = Capacity::from_limits(Some(3), Some(1024));
        assert!(matches!(
            result,
            Err(CacheError::CapacityMisconfiguration { .. })
        ));
    }

    #[test]
    fn test_from_limits_zero() {
        assert!(Capacity::from_limits(Some(0), None).is_err());
        assert!(Capacity::from_limits(None, Some(0)).is_err());
    }

    #[test]
    fn test_from_kib() {
        assert_eq!(Capacity::from_kib(1.0).unwrap(), Capacity::MaxBytes(1024));
        assert_eq!(Capacity::from_kib(0.5).unwrap(), Capacity::MaxBytes(512));
        assert!(Capacity::from_kib(0.0).is_err());
        assert!(Capacity::from_kib(f64::NAN).is_err());
    }

    #[test]
    fn test_admits() {
        assert!(Capacity::Unbounded.admits(usize::MAX - 1, 0, 10));
        assert!(Capacity::MaxEntries(2).admits(1, 0, 0));
        assert!(!Capacity::MaxEntries(2).admits(2, 0, 0));
        assert!(Capacity::MaxBytes(16).admits(0, 8, 8));
        assert!(!Capacity::MaxBytes(16).admits(0, 9, 8));
    }

    #[test]
    fn test_exceeded_by() {
        assert!(!Capacity::MaxEntries(2).exceeded_by(2, 1000));
        assert!(Capacity::MaxEntries(2).exceeded_by(3, 0));
        assert!(Capacity::MaxBytes(16).exceeded_by(1, 17));
        assert!(!Capacity::Unbounded.exceeded_by(usize::MAX, usize::MAX));
    }
}
