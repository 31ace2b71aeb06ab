//! Journal Replay
//!
//! Reconstructs the live index segments from the journal history.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use crate::error::{FieldError, Result};
use crate::key::Key;

use super::reader::JournalReader;
use super::record::JournalRecord;
use super::segment::{IndexSegment, SegmentId};

/// Result of replaying a journal
#[derive(Debug, Clone, Default)]
pub struct Replay {
    /// Database key from the INIT record, if one was seen
    pub key: Option<Key>,

    /// Live segments, most recently written first
    pub segments: Vec<IndexSegment>,

    /// Number of complete records read
    pub records_read: u64,

    /// Whether the log ended in a partially written record
    pub torn_tail: bool,
}

/// Working sequence of segments in file order.
///
/// Slots are never reused while replaying; removal by identity empties the
/// earliest live slot holding that identity.
#[derive(Default)]
struct SegmentArena {
    slots: Vec<Option<IndexSegment>>,
    live: HashMap<SegmentId, VecDeque<usize>>,
}

impl SegmentArena {
    fn push(&mut self, segment: IndexSegment) {
        self.live
            .entry(segment.id.clone())
            .or_default()
            .push_back(self.slots.len());
        self.slots.push(Some(segment));
    }

    fn remove(&mut self, id: &SegmentId) -> bool {
        let Some(indices) = self.live.get_mut(id) else {
            return false;
        };
        let removed = indices
            .pop_front()
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::take)
            .is_some();
        if indices.is_empty() {
            self.live.remove(id);
        }
        removed
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.live.clear();
    }

    /// The last index written takes precedence, so it comes first
    fn into_newest_first(self) -> Vec<IndexSegment> {
        self.slots.into_iter().rev().flatten().collect()
    }
}

/// Replay every record from `reader`, materializing segments under `directory`
pub(crate) fn replay(directory: &Path, mut reader: JournalReader) -> Result<Replay> {
    let mut arena = SegmentArena::default();
    let mut key: Option<Key> = None;
    let mut records_read = 0u64;

    while let Some(record) = reader.next_record()? {
        records_read += 1;

        match record {
            JournalRecord::Init { key: found } => {
                tracing::debug!(key = %found, "TOC_INIT");
                let Some(expected) = key.clone() else {
                    key = Some(found);
                    continue;
                };
                if expected != found {
                    return Err(FieldError::KeyMismatch {
                        path: reader.path().to_path_buf(),
                        expected,
                        found,
                    });
                }
            }

            JournalRecord::Index {
                path,
                offset,
                metadata,
            } => {
                tracing::debug!(path = %path, offset, "TOC_INDEX");
                arena.push(IndexSegment {
                    location: directory.join(&path),
                    id: SegmentId::new(path, offset),
                    metadata,
                });
            }

            JournalRecord::Clear { path, offset } => {
                let removed = arena.remove(&SegmentId::new(path.as_str(), offset));
                tracing::debug!(path = %path, offset, removed, "TOC_CLEAR");
            }

            JournalRecord::Wipe => {
                tracing::debug!("TOC_WIPE");
                arena.clear();
            }
        }
    }

    let segments = arena.into_newest_first();
    tracing::info!(
        path = %reader.path().display(),
        segments = segments.len(),
        records = records_read,
        "Journal replayed"
    );

    Ok(Replay {
        key,
        segments,
        records_read,
        torn_tail: reader.torn_tail(),
    })
}
