//! Chunk addressing: pure arithmetic mapping byte offsets and ranges onto
//! chunk indices and in-chunk offsets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BinaryStoreError, Result};

/// Default chunk payload size (1 MiB).
pub const DEFAULT_CHUNK_LENGTH: u64 = 1024 * 1024;

/// Maximum payload size of a single chunk.
///
/// Validated on construction; always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct ChunkLength(u64);

impl ChunkLength {
    pub fn new(length: u64) -> Result<Self> {
        if length == 0 {
            return Err(BinaryStoreError::validation("chunk length must be positive"));
        }
        if usize::try_from(length).is_err() {
            return Err(BinaryStoreError::validation(format!(
                "chunk length {length} does not fit in memory"
            )));
        }
        Ok(Self(length))
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Chunk length as a buffer size.
    pub fn as_usize(&self) -> usize {
        // checked in `new`
        self.0 as usize
    }
}

impl Default for ChunkLength {
    fn default() -> Self {
        Self(DEFAULT_CHUNK_LENGTH)
    }
}

impl TryFrom<i64> for ChunkLength {
    type Error = BinaryStoreError;

    fn try_from(length: i64) -> Result<Self> {
        let length = u64::try_from(length).map_err(|_| {
            BinaryStoreError::validation(format!("chunk length may not be negative: {length}"))
        })?;
        Self::new(length)
    }
}

impl From<ChunkLength> for u64 {
    fn from(length: ChunkLength) -> Self {
        length.0
    }
}

impl FromStr for ChunkLength {
    type Err = BinaryStoreError;

    fn from_str(s: &str) -> Result<Self> {
        let length: i64 = s
            .trim()
            .parse()
            .map_err(|_| BinaryStoreError::validation(format!("invalid chunk length: {s:?}")))?;
        Self::try_from(length)
    }
}

impl fmt::Display for ChunkLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of the chunk holding `offset`.
pub fn chunk_index_of(offset: u64, chunk_length: ChunkLength) -> u64 {
    offset / chunk_length.get()
}

/// Position of `offset` inside its chunk.
pub fn offset_within_chunk(offset: u64, chunk_length: ChunkLength) -> u64 {
    offset % chunk_length.get()
}

/// Inclusive byte interval `[start, end]` over an object's logical offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(BinaryStoreError::validation(format!(
                "byte range start {start} is past its end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered; ranges are inclusive so this is never zero.
    ///
    /// Saturates for `[0, u64::MAX]`, whose true length does not fit in a `u64`.
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }
}

impl TryFrom<(i64, i64)> for ByteRange {
    type Error = BinaryStoreError;

    fn try_from((start, end): (i64, i64)) -> Result<Self> {
        let start = u64::try_from(start).map_err(|_| {
            BinaryStoreError::validation(format!("byte range start may not be negative: {start}"))
        })?;
        let end = u64::try_from(end).map_err(|_| {
            BinaryStoreError::validation(format!("byte range end may not be negative: {end}"))
        })?;
        Self::new(start, end)
    }
}

/// Parses `"start-end"`, e.g. `"0-1023"`.
impl FromStr for ByteRange {
    type Err = BinaryStoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BinaryStoreError::validation(format!("invalid byte range: {s:?}"));
        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        if start.is_empty() || end.is_empty() {
            return Err(invalid());
        }
        let start: u64 = start.parse().map_err(|_| invalid())?;
        let end: u64 = end.parse().map_err(|_| invalid())?;
        Self::new(start, end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Chunk coordinates of a [`ByteRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// First chunk holding bytes of the range.
    pub first_chunk: u64,
    /// Last chunk holding bytes of the range (inclusive).
    pub last_chunk: u64,
    /// Bytes to drop from the head of `first_chunk`.
    pub skip: u64,
    /// Bytes to yield once `skip` bytes were dropped.
    pub length: u64,
}

impl ChunkSpan {
    pub fn for_range(range: ByteRange, chunk_length: ChunkLength) -> Self {
        Self {
            first_chunk: chunk_index_of(range.start(), chunk_length),
            last_chunk: chunk_index_of(range.end(), chunk_length),
            skip: offset_within_chunk(range.start(), chunk_length),
            length: range.len(),
        }
    }

    pub fn chunk_count(&self) -> u64 {
        (self.last_chunk - self.first_chunk).saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len(n: u64) -> ChunkLength {
        ChunkLength::new(n).unwrap()
    }

    #[test]
    fn test_chunk_index_and_offset() {
        let l = len(5);
        assert_eq!(chunk_index_of(0, l), 0);
        assert_eq!(chunk_index_of(4, l), 0);
        assert_eq!(chunk_index_of(5, l), 1);
        assert_eq!(chunk_index_of(11, l), 2);
        assert_eq!(offset_within_chunk(0, l), 0);
        assert_eq!(offset_within_chunk(7, l), 2);
        assert_eq!(offset_within_chunk(10, l), 0);
    }

    #[test]
    fn test_span_crossing_chunk_boundary() {
        let span = ChunkSpan::for_range(ByteRange::new(3, 7).unwrap(), len(5));
        assert_eq!(
            span,
            ChunkSpan {
                first_chunk: 0,
                last_chunk: 1,
                skip: 3,
                length: 5,
            }
        );
        assert_eq!(span.chunk_count(), 2);
    }

    #[test]
    fn test_span_within_one_chunk() {
        let span = ChunkSpan::for_range(ByteRange::new(6, 8).unwrap(), len(5));
        assert_eq!(span.first_chunk, 1);
        assert_eq!(span.last_chunk, 1);
        assert_eq!(span.skip, 1);
        assert_eq!(span.length, 3);
    }

    #[test]
    fn test_single_byte_range() {
        let range = ByteRange::new(9, 9).unwrap();
        assert_eq!(range.len(), 1);
        let span = ChunkSpan::for_range(range, ChunkLength::default());
        assert_eq!(span.first_chunk, 0);
        assert_eq!(span.skip, 9);
    }

    #[test]
    fn test_widest_range_does_not_overflow() {
        let range = ByteRange::new(0, u64::MAX).unwrap();
        assert_eq!(range.len(), u64::MAX);

        let span = ChunkSpan::for_range(range, len(5));
        assert_eq!(span.first_chunk, 0);
        assert_eq!(span.last_chunk, u64::MAX / 5);
        assert_eq!(span.length, u64::MAX);
        assert_eq!(ChunkSpan::for_range(range, len(1)).chunk_count(), u64::MAX);

        let range: ByteRange = "1-18446744073709551615".parse().unwrap();
        assert_eq!(range.len(), u64::MAX);
    }

    #[test]
    fn test_range_validation() {
        assert!(matches!(
            ByteRange::new(8, 3),
            Err(BinaryStoreError::Validation(_))
        ));
        assert!(ByteRange::try_from((-1, 3)).is_err());
        assert!(ByteRange::try_from((0, -3)).is_err());
        assert_eq!(
            ByteRange::try_from((2, 4)).unwrap(),
            ByteRange::new(2, 4).unwrap()
        );
    }

    #[test]
    fn test_range_parse() {
        let range: ByteRange = "8-11".parse().unwrap();
        assert_eq!((range.start(), range.end()), (8, 11));
        assert_eq!(range.to_string(), "8-11");
        assert!("11-8".parse::<ByteRange>().is_err());
        assert!("-8".parse::<ByteRange>().is_err());
        assert!("8-".parse::<ByteRange>().is_err());
        assert!("abc".parse::<ByteRange>().is_err());
    }

    #[test]
    fn test_chunk_length_validation() {
        assert!(ChunkLength::new(0).is_err());
        assert!(ChunkLength::try_from(-5i64).is_err());
        assert_eq!(ChunkLength::default().get(), 1_048_576);
        assert_eq!("4096".parse::<ChunkLength>().unwrap().get(), 4096);
        assert!("-1".parse::<ChunkLength>().is_err());
        assert!("lots".parse::<ChunkLength>().is_err());
    }
}
