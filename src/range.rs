//! Byte range value type.
//!
//! Ranges are inclusive on both ends, matching the HTTP `Range` header
//! convention used by object-store range GETs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a range's start lies past its end.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid byte range: start {start} > end {end}")]
pub struct InvalidRange {
    pub start: u64,
    pub end: u64,
}

/// An inclusive-inclusive byte range `[start, end]` within a remote object.
///
/// Immutable once created; `start <= end` is enforced at construction, so a
/// `ByteRange` always covers at least one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Create a range covering `[start, end]`.
    pub fn new(start: u64, end: u64) -> Result<Self, InvalidRange> {
        if start > end {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First byte offset covered by this range.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte offset covered by this range.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered (inclusive-inclusive).
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether `pos` falls inside this range.
    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos <= self.end
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_inclusive() {
        let range = ByteRange::new(0, 0).unwrap();
        assert_eq!(range.size(), 1);

        let range = ByteRange::new(10, 19).unwrap();
        assert_eq!(range.size(), 10);
    }

    #[test]
    fn test_contains_boundaries() {
        let range = ByteRange::new(5, 9).unwrap();
        assert!(!range.contains(4));
        assert!(range.contains(5));
        assert!(range.contains(7));
        assert!(range.contains(9));
        assert!(!range.contains(10));
    }

    #[test]
    fn test_start_after_end_rejected() {
        let err = ByteRange::new(10, 9).unwrap_err();
        assert_eq!(err, InvalidRange { start: 10, end: 9 });
    }
}
