//! Index segments
//!
//! One physical extent of index data, as reconstructed from the journal.

use std::path::PathBuf;

/// Identity of a segment: relative path within the database plus offset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId {
    pub path: String,
    pub offset: u64,
}

impl SegmentId {
    pub fn new(path: impl Into<String>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// A live index segment (immutable once materialized)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSegment {
    /// Identity, as written in the INDEX record
    pub id: SegmentId,
    /// Absolute location: database directory joined with `id.path`
    pub location: PathBuf,
    /// Segment-specific encoded metadata, opaque to the journal
    pub metadata: Vec<u8>,
}

impl IndexSegment {
    pub fn path(&self) -> &str {
        &self.id.path
    }

    pub fn offset(&self) -> u64 {
        self.id.offset
    }
}
